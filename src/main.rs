//! Sign Recognizer
//!
//! Entry point: loads settings, sets up logging and dispatches the subcommand.

use std::fs::File;
use std::io::BufReader;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use clap::Parser;

use sign_recognizer::api::{run_server, AppState};
use sign_recognizer::capture::{read_frames, GestureRecorder, RecorderEvent, SampleStore};
use sign_recognizer::cli::{replay_interval, Cli, Commands};
use sign_recognizer::ml::GestureModel;
use sign_recognizer::pipeline::{FrameOutcome, RecognitionWorker, StreamFrame};
use sign_recognizer::recognition::{LetterRecognizer, RecognitionSession, FEATURE_COUNT};
use sign_recognizer::settings::RecognizerSettings;
use sign_recognizer::telemetry::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = RecognizerSettings::load_or_default(cli.config.as_deref()).context("Failed to load settings")?;

    let log_config = settings.logging.log_config().with_verbosity(cli.verbose);
    // Keep the guard alive so file logs are flushed on exit
    let _log_guard = init_logging(&log_config).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    for warning in settings.warnings() {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Serve { port } => serve(&settings, port),
        Commands::Replay { input, fps } => replay(&settings, &input, fps),
        Commands::Record {
            label,
            input,
            samples,
            fresh,
        } => record(&settings, &label, &input, samples, fresh),
        Commands::Dataset => dataset(&settings),
        Commands::WriteConfig { path } => write_config(&settings, path),
    }
}

fn load_word_session(settings: &RecognizerSettings) -> anyhow::Result<RecognitionSession> {
    let word = &settings.word;
    let model = GestureModel::load_onnx(
        &word.model_path,
        &word.label_map_path,
        word.sequence_length,
        word.feature_count,
    )
    .context("Failed to load word model")?;

    Ok(RecognitionSession::new(model, word.recognizer_config()))
}

fn load_letters(settings: &RecognizerSettings) -> anyhow::Result<Option<LetterRecognizer>> {
    let Some(letter) = &settings.letter else {
        tracing::info!("No letter model configured, /predict disabled");
        return Ok(None);
    };

    let model = GestureModel::load_onnx(&letter.model_path, &letter.label_map_path, 1, letter.feature_count)
        .context("Failed to load letter model")?;

    Ok(Some(LetterRecognizer::new(
        model,
        letter.feature_count,
        letter.confidence_threshold,
    )))
}

fn serve(settings: &RecognizerSettings, port: Option<u16>) -> anyhow::Result<()> {
    // Never serve with a partially loaded model set
    let session = load_word_session(settings)?;
    let letters = load_letters(settings)?;

    let ip: IpAddr = settings
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {:?}", settings.server.bind_address))?;
    let addr = SocketAddr::new(ip, port.unwrap_or(settings.server.port));

    let state = AppState::new(session, letters).into_handle();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("api")
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Interrupt received");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        });

        run_server(addr, state, shutdown_rx).await
    })?;

    Ok(())
}

fn open_stream(input: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    Ok(BufReader::new(file))
}

fn replay(settings: &RecognizerSettings, input: &Path, fps: f32) -> anyhow::Result<()> {
    let session = load_word_session(settings)?;
    let mut worker = RecognitionWorker::spawn(session).context("Failed to start recognition worker")?;

    let frame_interval = replay_interval(fps);
    let started = Instant::now();
    let mut words = Vec::new();
    let mut frames = 0u64;

    let report = |outcome: FrameOutcome, words: &mut Vec<String>| {
        if let Some(label) = outcome.prediction.label {
            tracing::info!(
                frame = outcome.frame_number,
                confidence = outcome.prediction.confidence,
                "Recognized {}",
                label
            );
            words.push(label);
        }
    };

    for frame in read_frames(open_stream(input)?) {
        let frame = frame.with_context(|| format!("Bad frame in {}", input.display()))?;
        let stream_frame = StreamFrame {
            frame_number: frames,
            hands: frame.hands,
        };

        match frame_interval {
            Some(interval) => {
                let due = interval.mul_f64(frames as f64);
                if let Some(wait) = due.checked_sub(started.elapsed()) {
                    std::thread::sleep(wait);
                }
                worker.submit(stream_frame);
            }
            None => {
                worker.submit_blocking(stream_frame);
            }
        }
        frames += 1;

        for outcome in worker.outcomes().try_iter() {
            report(outcome, &mut words);
        }
    }

    worker.stop();
    for outcome in worker.outcomes().try_iter() {
        report(outcome, &mut words);
    }

    tracing::info!(
        frames,
        dropped = worker.dropped_frames(),
        words = words.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Replay finished"
    );
    println!("{}", words.join(" "));

    Ok(())
}

fn record(
    settings: &RecognizerSettings,
    label: &str,
    input: &Path,
    samples: Option<usize>,
    fresh: bool,
) -> anyhow::Result<()> {
    let capture = &settings.capture;
    let store = SampleStore::new(&capture.data_dir, capture.sequence_length, FEATURE_COUNT);

    if fresh {
        let removed = store.clear_label(label)?;
        tracing::info!(label, removed, "Cleared existing samples");
    }

    let target = samples.unwrap_or(capture.samples_per_label);
    let existing = store.count(label)?;
    tracing::info!(label, existing, target, "Recording samples from {}", input.display());

    let recorder_config = capture.recorder_config();
    let absence = recorder_config.absence;
    let mut recorder = GestureRecorder::new(recorder_config);
    let mut saved = 0usize;
    let mut discarded = 0usize;
    let mut last_timestamp = Duration::ZERO;

    let handle = |event: RecorderEvent, saved: &mut usize, discarded: &mut usize| -> anyhow::Result<()> {
        match event {
            RecorderEvent::Started { hands } => tracing::debug!(hands, "Gesture started"),
            RecorderEvent::Captured(frames) => {
                let path = store.save(label, &frames)?;
                *saved += 1;
                tracing::info!(path = %path.display(), "Sample {}/{} saved", saved, target);
            }
            RecorderEvent::TooShort { .. } => *discarded += 1,
        }
        Ok(())
    };

    for frame in read_frames(open_stream(input)?) {
        if saved >= target {
            break;
        }
        let frame = frame.with_context(|| format!("Bad frame in {}", input.display()))?;
        last_timestamp = frame.timestamp;
        if let Some(event) = recorder.observe(frame.timestamp, &frame.hands) {
            handle(event, &mut saved, &mut discarded)?;
        }
    }

    // A stream that ends mid-gesture counts as the hands going down
    if saved < target && recorder.is_recording() {
        if let Some(event) = recorder.observe(last_timestamp + absence, &[]) {
            handle(event, &mut saved, &mut discarded)?;
        }
    }

    tracing::info!(label, saved, discarded, "Recording finished");
    println!("{}: {} saved, {} discarded, {} total", label, saved, discarded, existing + saved);

    Ok(())
}

fn dataset(settings: &RecognizerSettings) -> anyhow::Result<()> {
    let capture = &settings.capture;
    let store = SampleStore::new(&capture.data_dir, capture.sequence_length, FEATURE_COUNT);
    let summary = store.scan()?;

    println!("{}", store.root().display());
    for (label, count) in &summary.counts {
        println!("  {:<16} {}", label, count);
    }
    println!("  {} samples, {} skipped", summary.total(), summary.skipped.len());

    Ok(())
}

fn write_config(settings: &RecognizerSettings, path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = path
        .or_else(RecognizerSettings::default_path)
        .context("No config directory on this platform; pass a path")?;
    settings.save_to_file(&path)?;
    println!("Settings written to {}", path.display());
    for warning in settings.warnings() {
        println!("  warning: {}", warning);
    }
    Ok(())
}
