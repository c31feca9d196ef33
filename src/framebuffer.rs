use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame has {got} bytes, frame buffer takes {want}")]
    FrameSize { got: usize, want: usize },
    #[error("frame reader is gone")]
    Disconnected,
}

/// Creates the two halves of a double-buffered frame handoff.
///
/// Exactly two physical buffers circulate between a write pool and a ready
/// queue; ownership moves through the channels, the only copy is the one in
/// `write_frame`. The writer blocks while both buffers sit on the reader
/// side, which is the backpressure that keeps a fast producer honest.
pub fn frame_buffer(frame_size: usize) -> (FrameWriter, FrameReader) {
    let (ready_tx, ready_rx) = mpsc::channel();
    let (pool_tx, pool_rx) = mpsc::channel();

    // both buffers start out writer-owned
    pool_tx.send(vec![0; frame_size]).unwrap();
    pool_tx.send(vec![0; frame_size]).unwrap();

    let writer = FrameWriter {
        pool: pool_rx,
        ready: Some(ready_tx),
        frame_size,
    };
    let reader = FrameReader {
        ready: ready_rx,
        pool: pool_tx,
        current: None,
        progress: 0,
    };
    (writer, reader)
}

/// The producer half. Single-threaded use only.
pub struct FrameWriter {
    pool: Receiver<Vec<u8>>,
    ready: Option<Sender<Vec<u8>>>,
    frame_size: usize,
}

impl FrameWriter {
    /// Queues one complete frame for the reader, blocking until a buffer is
    /// available. Frames written after `close` are dropped silently; a frame
    /// that cannot be delivered because the reader itself is gone is an
    /// error, since nothing will ever consume it.
    pub fn write_frame(&mut self, frame: &[u8]) -> Result<(), FrameError> {
        if frame.len() != self.frame_size {
            return Err(FrameError::FrameSize {
                got: frame.len(),
                want: self.frame_size,
            });
        }

        let ready = match &self.ready {
            Some(ready) => ready,
            None => {
                log::debug!("Dropping frame written after close");
                return Ok(());
            }
        };

        // blocks while both buffers are on the reader side
        let mut buffer = match self.pool.recv() {
            Ok(buffer) => buffer,
            Err(_) => return Err(FrameError::Disconnected),
        };
        buffer.copy_from_slice(frame);
        if ready.send(buffer).is_err() {
            return Err(FrameError::Disconnected);
        }
        Ok(())
    }

    /// Signals that no more frames will arrive. Frames already queued can
    /// still be drained by the reader.
    pub fn close(&mut self) {
        self.ready = None;
    }
}

/// The consumer half. Streams queued frames out byte-by-byte across reads of
/// any size, returning each drained buffer to the writer's pool.
pub struct FrameReader {
    ready: Receiver<Vec<u8>>,
    pool: Sender<Vec<u8>>,
    current: Option<Vec<u8>>,
    progress: usize,
}

impl Read for FrameReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            if self.current.is_none() {
                match self.ready.recv() {
                    Ok(frame) => self.current = Some(frame),
                    // writer closed and the queue is drained
                    Err(_) => return Ok(n),
                }
            }

            let frame = self.current.as_ref().unwrap();
            let take = (buf.len() - n).min(frame.len() - self.progress);
            buf[n..n + take].copy_from_slice(&frame[self.progress..self.progress + take]);
            self.progress += take;
            n += take;

            if self.progress == frame.len() {
                // hand the drained buffer back for re-use; if the writer is
                // gone the buffer just gets dropped
                let frame = self.current.take().unwrap();
                let _ = self.pool.send(frame);
                self.progress = 0;
            }
        }
        Ok(n)
    }
}
