use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};

pub const SAMPLE_RATE: usize = 44_100;

/// An ffmpeg child process decoding the input file to a raw stream of mono
/// big-endian f64 samples at 44.1 kHz on its stdout.
pub struct AudioSource {
    child: Child,
}

impl AudioSource {
    pub fn spawn(ffmpeg: &str, audio_file: &Path) -> Result<(AudioSource, ChildStdout), String> {
        let mut child = Command::new(ffmpeg)
            .arg("-i")
            .arg(audio_file)
            .args(["-vn", "-ar", "44100", "-ac", "1"])
            .args(["-f", "f64be", "-c:a", "pcm_f64be", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|error| format!("Cannot start ffmpeg decoder: {}", error))?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => return Err("ffmpeg decoder has no stdout pipe".to_string()),
        };
        Ok((AudioSource { child }, stdout))
    }

    pub fn wait(mut self) -> io::Result<ExitStatus> {
        self.child.wait()
    }
}

/// Slices a raw f64be byte stream into fixed-size sample blocks.
pub struct SampleReader<R: Read> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: Read> SampleReader<R> {
    pub fn new(reader: R, samples_per_block: usize) -> SampleReader<R> {
        SampleReader {
            reader,
            buffer: vec![0; samples_per_block * 8],
        }
    }

    /// Fills `block` with the next batch of samples. Returns Ok(false) once
    /// the stream runs out; a short final read is ordinary termination, not
    /// an error, and its partial data is discarded.
    pub fn next_block(&mut self, block: &mut [f64]) -> io::Result<bool> {
        debug_assert_eq!(block.len() * 8, self.buffer.len());

        match self.reader.read_exact(&mut self.buffer) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => return Ok(false),
            Err(error) => return Err(error),
        }

        for (sample, bytes) in block.iter_mut().zip(self.buffer.chunks_exact(8)) {
            *sample = f64::from_be_bytes(bytes.try_into().unwrap());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_big_endian_doubles() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.5f64.to_be_bytes());
        bytes.extend_from_slice(&(-0.25f64).to_be_bytes());

        let mut reader = SampleReader::new(Cursor::new(bytes), 2);
        let mut block = [0.0; 2];
        assert!(reader.next_block(&mut block).unwrap());
        assert_eq!(block, [1.5, -0.25]);
    }

    #[test]
    fn short_final_read_ends_the_stream() {
        // one full block plus a trailing half-sample
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2.0f64.to_be_bytes());
        bytes.extend_from_slice(&[0xff; 4]);

        let mut reader = SampleReader::new(Cursor::new(bytes), 1);
        let mut block = [0.0; 1];
        assert!(reader.next_block(&mut block).unwrap());
        assert_eq!(block, [2.0]);
        assert!(!reader.next_block(&mut block).unwrap());
    }

    #[test]
    fn empty_stream_ends_immediately() {
        let mut reader = SampleReader::new(Cursor::new(Vec::new()), 4);
        let mut block = [0.0; 4];
        assert!(!reader.next_block(&mut block).unwrap());
    }
}
