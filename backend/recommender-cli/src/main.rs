use anyhow::Context;
use clap::Parser;
use recommender_cli::{console, render, Args, Config, LogFormat, Session};
use recommender_core::RecommendationEngine;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid RECOMMENDER_* environment: {}", err);
            return ExitCode::FAILURE;
        }
    };
    config.apply_args(&args);

    init_tracing(config.log_format);

    if args.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    let mut stdout = io::stdout().lock();

    let engine = match open_engine(&config) {
        Ok(engine) => engine,
        Err(err) => {
            error!(error = %format!("{:#}", err), "Recommender initialization failed");
            if let Err(err) = render::init_failure(&mut stdout, format!("{:#}", err)) {
                warn!(error = %err, "Failed to write initialization error");
            }
            return ExitCode::FAILURE;
        }
    };

    let outcome = match args.user {
        Some(user_id) if args.json => {
            console::print_json(&engine, user_id, config.result_count, &mut stdout)
        }
        Some(user_id) => {
            console::show_recommendations(&engine, user_id, config.result_count, &mut stdout)
        }
        None => Session::new(&engine, &config, io::stdin().lock(), &mut stdout)
            .run()
            .map(|_| true),
    };

    if let Err(err) = stdout.flush() {
        warn!(error = %err, "Failed to flush stdout");
    }
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!(error = %format!("{:#}", err), "Recommender session aborted");
            ExitCode::FAILURE
        }
    }
}

fn open_engine(config: &Config) -> anyhow::Result<RecommendationEngine> {
    config.validate().context("invalid configuration")?;

    let (engine, stats) = RecommendationEngine::open(
        &config.data_path,
        &config.load_options(),
        config.recommender_config(),
    )
    .with_context(|| format!("could not load ratings from {}", config.data_path.display()))?;

    let metadata = engine.metadata();
    info!(
        users = metadata.user_count,
        items = metadata.item_count,
        ratings = metadata.rating_count,
        skipped = stats.skipped,
        neighborhood_size = config.neighborhood_size,
        metric = %config.metric,
        "Recommender ready"
    );

    Ok(engine)
}

// Logs go to stderr so they never interleave with recommendations on stdout
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .init(),
    }
}
