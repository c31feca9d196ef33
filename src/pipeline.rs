use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::analyzer::{AnalysisError, Analyzer};
use crate::audiosource::SampleReader;
use crate::framebuffer::{FrameError, FrameWriter};
use crate::pathcomposer::PathComposer;
use crate::spectrumhistory::SpectrumHistory;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("sample stream error: {0}")]
    Io(#[from] io::Error),
}

/// One sample block in, one composited frame out.
pub struct Pipeline {
    analyzer: Analyzer,
    history: SpectrumHistory,
    composer: PathComposer,
}

impl Pipeline {
    pub fn new(analyzer: Analyzer, history: SpectrumHistory, composer: PathComposer) -> Pipeline {
        Pipeline {
            analyzer,
            history,
            composer,
        }
    }

    pub fn block_len(&self) -> usize {
        self.analyzer.block_len()
    }

    pub fn frame_size(&self) -> usize {
        self.composer.frame_size()
    }

    pub fn history(&self) -> &SpectrumHistory {
        &self.history
    }

    /// Analyzes the block (mutating it in place) and composites the frame.
    /// The returned raster bytes are only valid until the next call.
    pub fn process_block(&mut self, block: &mut [f64]) -> Result<&[u8], PipelineError> {
        let spectrum = self.analyzer.analyze(block)?;
        let frame = self.history.advance(spectrum);
        Ok(self.composer.render(&mut self.history, frame))
    }
}

/// The producer loop: pulls sample blocks until the stream ends or `stop` is
/// raised, pushing one frame per block into the frame buffer. Closes the
/// writer on the way out so the consumer can drain and finish.
pub fn run<R: Read>(
    mut samples: SampleReader<R>,
    pipeline: &mut Pipeline,
    mut frames: FrameWriter,
    stop: &AtomicBool,
) -> Result<u64, PipelineError> {
    let mut block = vec![0.0; pipeline.block_len()];
    let mut produced: u64 = 0;

    let result = loop {
        if stop.load(Ordering::SeqCst) {
            log::info!("Interrupted, stopping after {} frames", produced);
            break Ok(produced);
        }
        match samples.next_block(&mut block) {
            Ok(true) => {}
            Ok(false) => break Ok(produced),
            Err(error) => break Err(PipelineError::Io(error)),
        }

        match pipeline.process_block(&mut block) {
            Ok(frame) => {
                if let Err(error) = frames.write_frame(frame) {
                    break Err(error.into());
                }
            }
            Err(error) => break Err(error),
        }
        produced += 1;
    };

    frames.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::framebuffer;
    use std::io::Cursor;
    use std::thread;

    fn silent_pipeline(width: u32, height: u32) -> Pipeline {
        let config = Config::default();
        let analyzer = Analyzer::new(config.samples_per_block(), config.window);
        let history = SpectrumHistory::new(config.layer_styles().unwrap());
        let composer =
            PathComposer::new(width, height, config.base_radius, config.height_multiplier).unwrap();
        Pipeline::new(analyzer, history, composer)
    }

    #[test]
    fn two_seconds_of_silence_make_sixty_frames() {
        let (width, height) = (64, 36);
        let mut pipeline = silent_pipeline(width, height);
        let frame_size = pipeline.frame_size();

        // 2 s of silent mono f64be at 44.1 kHz, 30 fps
        let samples = Cursor::new(vec![0u8; 2 * 44_100 * 8]);
        let reader = SampleReader::new(samples, pipeline.block_len());

        let (writer, mut frame_reader) = framebuffer::frame_buffer(frame_size);
        let consumer = thread::spawn(move || {
            let mut sink = Vec::new();
            io::copy(&mut frame_reader, &mut sink).unwrap();
            sink
        });

        let stop = AtomicBool::new(false);
        let produced = run(reader, &mut pipeline, writer, &stop).unwrap();
        let sink = consumer.join().unwrap();

        assert_eq!(produced, 60);
        assert_eq!(sink.len(), 60 * frame_size);
        assert_eq!(frame_size, (width * height * 4) as usize);
        // cache slots stay bounded by the layer count after warm-up
        assert_eq!(pipeline.history().slot_count(), 8);
        assert_eq!(pipeline.history().frame(), 60);
    }

    #[test]
    fn dead_consumer_stops_the_run() {
        let mut pipeline = silent_pipeline(32, 32);
        // 2 s of input; none of it may be consumed once the sink is gone
        let samples = Cursor::new(vec![0u8; 2 * 44_100 * 8]);
        let reader = SampleReader::new(samples, pipeline.block_len());

        let (writer, frame_reader) = framebuffer::frame_buffer(pipeline.frame_size());
        drop(frame_reader);

        let stop = AtomicBool::new(false);
        let result = run(reader, &mut pipeline, writer, &stop);
        assert!(matches!(
            result,
            Err(PipelineError::Frame(FrameError::Disconnected))
        ));
        // the first undeliverable frame aborts the loop
        assert_eq!(pipeline.history().frame(), 1);
    }

    #[test]
    fn stop_flag_ends_the_run_early() {
        let mut pipeline = silent_pipeline(32, 32);
        let samples = Cursor::new(vec![0u8; 44_100 * 8]);
        let reader = SampleReader::new(samples, pipeline.block_len());
        let (writer, _frame_reader) = framebuffer::frame_buffer(pipeline.frame_size());

        let stop = AtomicBool::new(true);
        let produced = run(reader, &mut pipeline, writer, &stop).unwrap();
        assert_eq!(produced, 0);
    }
}
