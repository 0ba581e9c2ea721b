use anyhow::{Context, Result};
use probabilistic_classifier::ProbabilisticClassifier;

mod config;
mod dataset;
mod report;

use config::{DemoConfig, OutputFormat};
use report::Report;

fn main() -> Result<()> {
    // 1. Load .env, init tracing
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("Starting probabilistic classification after regression");

    // 2. Load configuration
    let config = DemoConfig::from_env()?;
    config.validate()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Confidence level: {:.1}%", config.confidence_level * 100.0);
    tracing::info!(
        "  Domain: x [{}, {}], y [{}, {}]",
        config.x_min,
        config.x_max,
        config.y_min,
        config.y_max
    );
    tracing::info!(
        "  Grid: {0} x {0} points",
        config.grid_resolution
    );
    tracing::info!("  GP theta0: {}", config.gp_theta0);

    // 3. Fit, predict, transform, extract
    let samples = dataset::reference_samples().context("failed to build reference samples")?;
    let grid = config.query_grid()?;
    let classifier = ProbabilisticClassifier::new(config.regressor()?, config.confidence()?);
    let evaluation = classifier
        .evaluate(&samples, &grid)
        .context("evaluation failed")?;
    let reference = dataset::reference_boundary(&grid).context("failed to trace true zero level set")?;

    // 4. Display
    let report = Report::new(&samples, &evaluation, reference);
    let rendered = match config.output_format {
        OutputFormat::Text => report::render_text(&report),
        OutputFormat::Json => report::render_json(&report)?,
    };

    match &config.output_path {
        Some(path) => {
            std::fs::write(path, rendered).with_context(|| format!("failed to write {path}"))?;
            tracing::info!("Report written to {}", path);
        }
        None => println!("{rendered}"),
    }

    Ok(())
}
