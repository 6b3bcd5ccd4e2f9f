use clap::Parser;
use gcs_cli::cli::{Cli, Commands};
use gcs_cli::commands::{diff, features, screen};
use tracing::error;
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to initialize logging: {err}");
        std::process::exit(1);
    }

    // Structural and configuration errors terminate immediately with a
    // descriptive message; there is no partial-result recovery.
    if let Err(err) = run(cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Screen {
            static_file,
            results,
            tap_changers,
            score_type,
            weights,
            model,
            replay,
            threads,
            dynamic_db,
            pre_generated,
            out_dir,
        } => screen::run(screen::ScreenParams {
            static_file,
            results,
            tap_changers,
            score_type,
            weights,
            model,
            replay,
            threads,
            dynamic_db,
            pre_generated,
            out_dir,
        }),
        Commands::Features {
            static_file,
            results,
            tap_changers,
            mode,
            out,
        } => features::run(features::FeatureParams {
            static_file,
            results,
            tap_changers,
            mode: mode.into(),
            out,
        }),
        Commands::Diff {
            manifest,
            replay_dir,
            out,
        } => diff::run(diff::DiffParams {
            manifest,
            replay_dir,
            out,
        }),
    }
}
