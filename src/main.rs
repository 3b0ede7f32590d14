use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use hearsee::{
    AudioSink, Completion, Config, DoubleTapDetector, FileSink, FileSource, ImageSource, Outcome,
    Pipeline, ProcessClient, SpeakerSink, encode_image, run_tap_loop,
};

/// HearSee - capture a photo, upload it, hear the answer
#[derive(Parser)]
#[command(name = "hearsee", version, about)]
struct Cli {
    /// Processing server base URL (overrides config and HEARSEE_SERVER_URL)
    #[arg(long)]
    server_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload one JPEG and play the spoken reply
    Submit {
        /// JPEG file to upload
        image: PathBuf,
        /// Write the reply audio here instead of playing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Capture loop: double-tap Enter to capture and upload
    Run {
        /// JPEG file read on each capture
        #[arg(short, long)]
        source: Option<PathBuf>,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hearsee=info",
        1 => "info,hearsee=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = &cli.server_url {
        config = config.with_base_url(url)?;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Command::Submit { image, output } => submit(&config, image, output).await,
        Command::Run { source } => run_loop(&config, source).await,
        Command::TestSpeaker => test_speaker(&config).await,
    }
}

/// Pick the sink: explicit output file, speakers, or the output directory
fn build_sink(config: &Config, output: Option<PathBuf>) -> anyhow::Result<Arc<dyn AudioSink>> {
    if let Some(path) = output {
        return Ok(Arc::new(FileSink::at_path(path)));
    }

    if config.playback.enabled {
        return Ok(Arc::new(SpeakerSink::new(&config.playback)?));
    }

    tracing::info!(
        dir = %config.playback.output_dir.display(),
        "speaker playback disabled, writing audio files"
    );
    Ok(Arc::new(FileSink::in_dir(&config.playback.output_dir)))
}

/// Upload one image and wait for the cycle to finish
async fn submit(config: &Config, image: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let jpeg = tokio::fs::read(&image)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", image.display()))?;

    let client = ProcessClient::new(&config.server)?;
    let sink = build_sink(config, output)?;
    let (pipeline, _completions) = Pipeline::new(client, sink);

    tracing::info!(image = %image.display(), bytes = jpeg.len(), "submitting image");

    match pipeline.process(encode_image(&jpeg)).await? {
        Outcome::Played { bytes } => println!("Played {bytes} bytes of audio"),
        Outcome::NoAudio => println!("Server returned no audio"),
    }

    Ok(())
}

/// Interactive capture loop driven by double-taps on Enter
async fn run_loop(config: &Config, source: Option<PathBuf>) -> anyhow::Result<()> {
    let path = source
        .or_else(|| config.capture.source.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("no capture source: pass --source or set capture.source")
        })?;

    let mut file_source = FileSource::new(path);
    if let Some(dir) = &config.capture.archive_dir {
        file_source = file_source.with_archive_dir(dir);
    }
    let source_path = file_source.path().to_path_buf();
    let source: Arc<dyn ImageSource> = Arc::new(file_source);

    let client = ProcessClient::new(&config.server)?;
    let sink = build_sink(config, None)?;
    let (pipeline, mut completions) = Pipeline::new(client, sink);

    let mut detector = DoubleTapDetector::new(config.gesture.double_tap_timeout);
    let input = BufReader::new(tokio::io::stdin());

    tracing::info!(
        server = %config.server.base_url,
        source = %source_path.display(),
        timeout = ?detector.timeout(),
        "ready - double-tap Enter to capture"
    );

    let tap_loop = run_tap_loop(
        &pipeline,
        &mut completions,
        &source,
        &mut detector,
        input,
        report,
    );

    tokio::select! {
        result = tap_loop => {
            let completed = result?;
            tracing::info!(completed, "input closed");
        }
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    tracing::info!("shutting down");
    Ok(())
}

/// Log a finished cycle; failures were already logged where they happened
fn report(completion: &Completion) {
    match &completion.outcome {
        Ok(Outcome::Played { bytes }) => {
            tracing::info!(id = completion.id, bytes, "cycle complete");
        }
        Ok(Outcome::NoAudio) => {
            tracing::warn!(id = completion.id, "cycle complete, no audio returned");
        }
        Err(e) => tracing::debug!(id = completion.id, error = %e, "cycle failed"),
    }
}

/// Test speaker output with a sine wave
async fn test_speaker(config: &Config) -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = SpeakerSink::new(&config.playback)?;

    // Generate 2 seconds of 440Hz sine wave at 24kHz sample rate
    let sample_rate = 24000_u32;
    let frequency = 440.0_f32;
    let num_samples = sample_rate as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {} samples at {} Hz...", samples.len(), sample_rate);

    playback.play_samples(samples, sample_rate).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");
    println!("  3. Try: pavucontrol (to check output levels)");

    Ok(())
}
