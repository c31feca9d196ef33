pub(crate) mod analyzer;
pub(crate) mod audiosource;
pub(crate) mod config;
pub(crate) mod framebuffer;
pub(crate) mod pathcomposer;
pub(crate) mod pipeline;
pub(crate) mod spectrumhistory;
pub(crate) mod videosink;
pub(crate) mod windowfunction;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::Parser;

use crate::analyzer::Analyzer;
use crate::audiosource::{AudioSource, SampleReader};
use crate::config::Config;
use crate::pathcomposer::PathComposer;
use crate::pipeline::Pipeline;
use crate::spectrumhistory::SpectrumHistory;
use crate::videosink::VideoSink;

#[derive(Parser)]
struct Cli {
    /// The audio file to visualize
    #[arg(short, long, value_name = "FILE")]
    audio: std::path::PathBuf,

    /// The video file to write
    #[arg(short, long, value_name = "FILE", default_value = "output/output.mkv")]
    video: std::path::PathBuf,

    /// A TOML file overriding the default configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,
}

fn main() {
    env_logger::init();
    let args = Cli::parse();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => panic!("Cannot load configuration: {}", msg),
    };
    let styles = match config.layer_styles() {
        Ok(styles) => styles,
        Err(msg) => panic!("Bad layer style table: {}", msg),
    };

    let composer = match PathComposer::new(
        config.width,
        config.height,
        config.base_radius,
        config.height_multiplier,
    ) {
        Ok(composer) => composer,
        Err(msg) => panic!("Cannot set up canvas: {}", msg),
    };

    let (audio, samples) = match AudioSource::spawn(&config.ffmpeg, &args.audio) {
        Ok(audio) => audio,
        Err(msg) => panic!("Cannot set up audio source: {}", msg),
    };
    let (video, encoder_stdin) = match VideoSink::spawn(&config, &args.audio, &args.video) {
        Ok(video) => video,
        Err(msg) => panic!("Cannot set up video sink: {}", msg),
    };

    let mut pipeline = Pipeline::new(
        Analyzer::new(config.samples_per_block(), config.window),
        SpectrumHistory::new(styles),
        composer,
    );
    let (frame_writer, mut frame_reader) = framebuffer::frame_buffer(pipeline.frame_size());

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(error) = ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst)) {
            log::warn!("Cannot install Ctrl-C handler: {}", error);
        }
    }

    let consumer = thread::Builder::new()
        .name("encoder".to_string())
        .spawn(move || {
            let mut encoder_stdin = encoder_stdin;
            io::copy(&mut frame_reader, &mut encoder_stdin)
        });
    let consumer = match consumer {
        Ok(handle) => handle,
        Err(error) => panic!("Failed to create thread: {}", error),
    };

    log::info!(
        "Visualizing {} at {} fps, {}x{}",
        args.audio.display(),
        config.fps,
        config.width,
        config.height
    );

    let reader = SampleReader::new(samples, config.samples_per_block());
    match pipeline::run(reader, &mut pipeline, frame_writer, &stop) {
        Ok(produced) => log::info!("Rendered {} frames", produced),
        Err(error) => log::error!("Pipeline stopped: {}", error),
    }

    match consumer.join() {
        Ok(Ok(bytes)) => log::debug!("Streamed {} bytes to the encoder", bytes),
        Ok(Err(error)) => log::error!("Encoder write failed: {}", error),
        Err(_) => log::error!("Encoder thread panicked"),
    }

    match video.finish() {
        Ok(status) if status.success() => log::info!("Wrote {}", args.video.display()),
        Ok(status) => log::error!("ffmpeg encoder exited with {}", status),
        Err(error) => log::error!("Cannot wait for the encoder: {}", error),
    }
    if let Err(error) = audio.wait() {
        log::warn!("Cannot wait for the decoder: {}", error);
    }
}
