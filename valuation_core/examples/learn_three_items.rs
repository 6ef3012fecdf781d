use ndarray::array;
use tracing_subscriber::EnvFilter;
use valuation_learning_core::config::ConfigError;
use valuation_learning_core::{
    Buyer, EllipsoidLearner, IterationObserver, IterationReport, JsonlJournal, LearnerConfig,
    LinearUtilityBuyer, TracingObserver, ValuationOracle,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    println!(
        "Loaded config: radius={} iterations={} verbose={}",
        config.initial_radius, config.max_iterations, config.verbose
    );

    let mut buyer = LinearUtilityBuyer::new(array![0.3, 0.3, 0.4], 1.0, 8)?;
    let truth = buyer.valuation_vector();
    let guess = array![0.3, 0.3, 0.4];

    let mut journal = config.journal.as_ref().map(JsonlJournal::from_config);
    let mut tracer = TracingObserver;
    let mut observer = |report: &IterationReport| {
        tracer.on_iteration(report);
        if let Some(journal) = journal.as_mut() {
            journal.on_iteration(report);
        }
    };

    let learner = EllipsoidLearner::new(config)?;
    let outcome = learner.run(&mut buyer, &guess, Some(&truth), &mut observer)?;

    let initial_volume = outcome.history.initial().volume();
    let final_ellipsoid = outcome.final_ellipsoid();
    println!(
        "{} answered {} experiments ({:?}); volume {:.3e} -> {:.3e}",
        buyer.name(),
        outcome.iterations(),
        outcome.stop_reason,
        initial_volume,
        final_ellipsoid.volume()
    );
    println!("True valuation:     {truth}");
    println!("Simplex estimate:   {}", outcome.simplex_estimate()?);
    println!("Truth still inside: {}", final_ellipsoid.contains(&truth));
    Ok(())
}

fn load_config() -> Result<LearnerConfig, ConfigError> {
    LearnerConfig::load_from_file("config/learner.toml").or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        Ok(LearnerConfig::default())
    })
}
