use super::IterationReport;

/// Receives one report per completed iteration.
pub trait IterationObserver {
    fn on_iteration(&mut self, report: &IterationReport);

    fn name(&self) -> &str {
        "UnknownObserver"
    }
}

impl<F> IterationObserver for F
where
    F: FnMut(&IterationReport),
{
    fn on_iteration(&mut self, report: &IterationReport) {
        self(report)
    }

    fn name(&self) -> &str {
        "ClosureObserver"
    }
}

/// Discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl IterationObserver for NoopObserver {
    fn on_iteration(&mut self, _report: &IterationReport) {}

    fn name(&self) -> &str {
        "NoopObserver"
    }
}

/// Forwards reports to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl IterationObserver for TracingObserver {
    fn on_iteration(&mut self, report: &IterationReport) {
        let max_eigenvalue = report.eigenvalues.last().copied().unwrap_or(f64::NAN);
        match report.reference_member {
            Some(member) => tracing::info!(
                "iteration {}: volume {:.3e}, max eigenvalue {:.3e}, reference inside: {}",
                report.iteration,
                report.volume,
                max_eigenvalue,
                member
            ),
            None => tracing::info!(
                "iteration {}: volume {:.3e}, max eigenvalue {:.3e}",
                report.iteration,
                report.volume,
                max_eigenvalue
            ),
        }
    }

    fn name(&self) -> &str {
        "TracingObserver"
    }
}
