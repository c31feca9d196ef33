use std::io;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use crate::config::Config;

/// An ffmpeg child process that muxes the original audio with the raw RGBA
/// frame stream arriving on its stdin and encodes the result.
pub struct VideoSink {
    child: Child,
}

impl VideoSink {
    pub fn spawn(
        config: &Config,
        audio_file: &Path,
        video_file: &Path,
    ) -> Result<(VideoSink, ChildStdin), String> {
        let dimensions = format!("{}x{}", config.width, config.height);
        let fps = config.fps.to_string();

        let mut command = Command::new(&config.ffmpeg);
        command
            .arg("-i")
            .arg(audio_file)
            .args(["-thread_queue_size", "32"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &dimensions, "-r", &fps, "-i", "-"])
            .arg("-c:v")
            .args(&config.video_codec)
            .arg("-c:a")
            .args(&config.audio_codec)
            .arg("-y")
            .arg(video_file)
            .stdin(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|error| format!("Cannot start ffmpeg encoder: {}", error))?;

        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => return Err("ffmpeg encoder has no stdin pipe".to_string()),
        };
        Ok((VideoSink { child }, stdin))
    }

    /// Waits for the encoder to flush and exit. The stdin handle returned by
    /// `spawn` must have been dropped first or this never returns.
    pub fn finish(mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }
}
