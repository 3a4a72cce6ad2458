//! Video Cutter - batch frame extraction and segmentation
//!
//! Command line front-end: collects the inputs, starts one batch on a
//! background worker, renders its progress and turns Ctrl-C into a
//! cancellation request.

use anyhow::{Result, anyhow, bail};
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use video_cutter::batch::{output_dir_name, BatchRequest, BatchWorker, CancelToken};
use video_cutter::cli::{Args, Commands};
use video_cutter::config::Config;
use video_cutter::discovery::discover_videos;
use video_cutter::error::VideoCutterError;
use video_cutter::media::{Interval, Job, JobRunnerFactory, MediaCommandBuilder, Mode};
use video_cutter::presenter::{render_summary, Presenter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Run { input_dir, output_dir, mode, interval, json } => {
            let mode = resolve_mode(mode.as_deref(), &config)?;
            let interval = interval.unwrap_or(config.batch.interval);
            run_batch(&config, input_dir, output_dir, mode, interval, json).await?;
        }
        Commands::Plan { input_dir, output_dir, mode, interval } => {
            let mode = resolve_mode(mode.as_deref(), &config)?;
            let interval = interval.unwrap_or(config.batch.interval);
            print_plan(&config, &input_dir, &output_dir, mode, interval)?;
        }
        Commands::Check => {
            let runner = JobRunnerFactory::create_runner(&config.media);
            runner.check_availability()?;
            println!("{}", runner.version_info()?);
            println!("ffmpeg binary: {}", config.media.binary_path);
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

async fn run_batch(
    config: &Config,
    input_dir: PathBuf,
    output_dir: PathBuf,
    mode: Mode,
    interval: f64,
    json: bool,
) -> Result<()> {
    info!(
        "Starting batch: {} -> {} ({} every {}s)",
        input_dir.display(),
        output_dir.display(),
        mode,
        interval
    );

    let request = BatchRequest {
        input_dir,
        output_root: output_dir,
        mode,
        interval,
    };
    let cancel = CancelToken::new();
    let (events_tx, events_rx) = unbounded_channel();
    let runner = JobRunnerFactory::create_runner(&config.media);
    let worker = BatchWorker::new(request, &config.media, runner, cancel.clone(), events_tx);

    let presenter = Presenter::new(json);
    let handle = worker.spawn();

    let consume = presenter.consume(events_rx);
    tokio::pin!(consume);
    loop {
        tokio::select! {
            _ = &mut consume => break,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                if cancel.is_cancelled() {
                    warn!("Second interrupt, aborting without waiting for ffmpeg");
                    std::process::exit(130);
                }
                info!("Cancellation requested by user");
                cancel.cancel();
                presenter.note_cancel_requested();
            }
        }
    }

    // start-time precondition failures surface here
    let summary = handle
        .await
        .map_err(|e| anyhow!("batch worker stopped unexpectedly: {}", e))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", render_summary(&summary));
    }

    Ok(())
}

fn print_plan(
    config: &Config,
    input_dir: &Path,
    output_dir: &Path,
    mode: Mode,
    interval: f64,
) -> Result<()> {
    let interval = Interval::new(interval)?;
    let videos = discover_videos(input_dir)?;
    if videos.is_empty() {
        return Err(VideoCutterError::InputNotFound(format!(
            "no video files found in {}",
            input_dir.display()
        ))
        .into());
    }

    let builder = MediaCommandBuilder::new(config.media.clone());
    let now = Local::now();
    for source in videos {
        let target = output_dir.join(output_dir_name(&source, now));
        let plan = builder.plan(&Job::new(source.clone(), target, mode, interval));

        println!("{}", source.display());
        println!("   $ {}", plan.primary.command_line());
        if let Some(fallback) = plan.fallback {
            println!("   on failure: $ {}", fallback.command_line());
        }
    }

    Ok(())
}

/// Mode from the command line, or the configured default
fn resolve_mode(mode: Option<&str>, config: &Config) -> Result<Mode> {
    match mode {
        Some(m) => Ok(m.parse::<Mode>()?),
        None => Ok(config.batch.mode),
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let app_dir = std::env::current_dir()?.join(".video-cutter");
    let log_dir = app_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "video-cutter.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console output goes to stderr so stdout stays clean for --json
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("video-cutter.log").display()
    );

    Ok(())
}
