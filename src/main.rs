#[allow(unused_imports)]
use log::{Level, trace, debug, info, warn, error};

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use framelabeler::build_info::BuildInfo;
use framelabeler::config::CONFIG;
use framelabeler::label_config::LabelConfig;
use framelabeler::labeler::BoundingBoxLabeler;
use framelabeler::logging;
use framelabeler::overlay::ConsoleOverlay;
use framelabeler::replay::{ReplayCapture, ReplaySession};
use framelabeler::sensor::LogSensor;

const APP_NAME: &str = "framelabeler";

/// Replay a recorded detection stream and report bounding box annotations
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about)]
struct Args {
    /// Label configuration file (YAML or JSON)
    #[arg(long)]
    labels: PathBuf,

    /// Recorded detection stream to replay (JSON)
    #[arg(long)]
    replay: PathBuf,

    /// Deliver detection results this many frames late (overrides settings)
    #[arg(long)]
    latency: Option<usize>,

    /// Treat readback as synchronous and flag ordering anomalies
    #[arg(long)]
    sync: bool,

    /// Custom settings file path
    #[arg(long)]
    settings: Option<String>,

    /// Export the captured debug log when the replay finishes
    #[arg(long)]
    export_logs: bool,
}

fn main() {
    let args = Args::parse();

    let log_buffer = logging::setup_logger(APP_NAME);
    logging::setup_panic_hook(APP_NAME, Arc::clone(&log_buffer));

    info!("framelabeler {}", BuildInfo::display_version());
    debug!("{}", BuildInfo::detailed_info());

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }

    if args.export_logs {
        if let Err(e) = logging::export_debug_logs(APP_NAME, log_buffer) {
            error!("Failed to export debug logs: {}", e);
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    // Settings file first, CLI flags on top
    let settings = framelabeler::settings::UserSettings::load(args.settings.as_deref());
    let latency = args.latency.unwrap_or(settings.readback_latency_frames);
    let sync_readback = args.sync || settings.sync_readback;

    if args.settings.is_none() {
        // Snapshot config is only meaningful for the default settings path
        debug!(
            "Config defaults: latency={}, sync={}, overlay={}",
            CONFIG.readback_latency_frames, CONFIG.sync_readback, CONFIG.show_overlay
        );
    }

    let mut label_config = LabelConfig::from_file(&args.labels)?;
    let (skipped, warnings) = label_config.validate_and_clean();
    if skipped > 0 {
        warn!("Skipped {} invalid label entr(ies)", skipped);
        for warning in &warnings {
            warn!("{}", warning);
        }
    }
    info!(
        "Label configuration loaded: {} entries from {}",
        label_config.len(),
        args.labels.display()
    );

    let mut capture = ReplayCapture::from_file(&args.replay)?;
    let (skipped, warnings) = capture.validate_and_clean();
    if skipped > 0 {
        warn!("Skipped {} invalid capture object(s)", skipped);
        for warning in &warnings {
            warn!("{}", warning);
        }
    }
    info!(
        "Capture loaded: {} frame(s), {} object(s) from {}",
        capture.frames.len(),
        capture.total_objects(),
        args.replay.display()
    );

    if sync_readback && latency > 0 {
        warn!(
            "Readback declared synchronous but replay latency is {} frame(s); expect ordering warnings",
            latency
        );
    }

    let sensor = Arc::new(LogSensor::new());
    let mut labeler = BoundingBoxLabeler::new(
        Arc::clone(&sensor),
        label_config,
        &settings.annotation_id,
        &settings.annotation_name,
        sync_readback,
    )?;
    if settings.show_overlay {
        labeler = labeler.with_overlay(Box::new(ConsoleOverlay::new()));
    }

    ReplaySession::new(latency).run(&capture, &labeler, &sensor);

    if labeler.pending_frames() > 0 {
        // Can only happen if the capture repeats frame ids
        warn!(
            "{} frame(s) were opened but never reported",
            labeler.pending_frames()
        );
    }

    Ok(())
}
