use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use thiserror::Error;

use crate::windowfunction::WindowFunction;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("sample block has {got} samples, analyzer was planned for {want}")]
    BlockLength { got: usize, want: usize },
}

/// Turns a block of samples into a magnitude spectrum of the same length.
///
/// The block length is whatever `sample_rate / fps` works out to, so the
/// transform has to cope with arbitrary (non-power-of-two) sizes.
pub struct Analyzer {
    fft: Arc<dyn Fft<f64>>,
    window: Vec<f64>,
    bins: Vec<Complex<f64>>,
    fft_scratch: Vec<Complex<f64>>,
    spectrum: Vec<f64>,
    block_len: usize,
}

impl Analyzer {
    pub fn new(block_len: usize, window_function: WindowFunction) -> Analyzer {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(block_len);
        let window = (0..block_len)
            .map(|i| window_function.weight(i, block_len))
            .collect();

        Analyzer {
            fft_scratch: vec![Complex::default(); fft.get_inplace_scratch_len()],
            fft,
            window,
            bins: vec![Complex::default(); block_len],
            spectrum: vec![0.0; block_len],
            block_len,
        }
    }

    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// Windows the block in place, so the block must be refilled before the
    /// next call. The returned spectrum is a view into an internal buffer
    /// that is overwritten by the next call; copy it to keep it.
    ///
    /// The full transform length is returned, mirror half included.
    pub fn analyze(&mut self, block: &mut [f64]) -> Result<&[f64], AnalysisError> {
        if block.len() != self.block_len {
            return Err(AnalysisError::BlockLength {
                got: block.len(),
                want: self.block_len,
            });
        }

        for (sample, weight) in block.iter_mut().zip(&self.window) {
            *sample *= weight;
        }

        for (bin, sample) in self.bins.iter_mut().zip(block.iter()) {
            *bin = Complex::new(*sample, 0.0);
        }
        self.fft.process_with_scratch(&mut self.bins, &mut self.fft_scratch);

        let scale = 100.0 / self.block_len as f64;
        for (magnitude, bin) in self.spectrum.iter_mut().zip(&self.bins) {
            *magnitude = bin.norm() * scale;
        }

        Ok(&self.spectrum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SAMPLE_RATE: f64 = 44_100.0;

    #[test]
    fn rejects_wrong_block_length() {
        let mut analyzer = Analyzer::new(1470, WindowFunction::Hamming);
        let mut block = vec![0.0; 1469];
        assert_eq!(
            analyzer.analyze(&mut block),
            Err(AnalysisError::BlockLength { got: 1469, want: 1470 })
        );
    }

    #[test]
    fn sinusoid_peaks_at_matching_bin() {
        // 30 fps at 44.1 kHz, so bins are 30 Hz wide and 300 Hz lands on bin 10
        let n = 1470;
        let freq = 300.0;
        let mut analyzer = Analyzer::new(n, WindowFunction::Hamming);
        let mut block: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / SAMPLE_RATE).sin())
            .collect();

        let spectrum = analyzer.analyze(&mut block).unwrap();
        assert_eq!(spectrum.len(), n);

        // Search the lower half only; the upper half mirrors it
        let peak = spectrum[..n / 2]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        let expected = (freq * n as f64 / SAMPLE_RATE).round() as usize;
        assert_eq!(peak, expected);
    }

    #[test]
    fn silence_is_all_zero() {
        let mut analyzer = Analyzer::new(147, WindowFunction::Rectangle);
        let mut block = vec![0.0; 147];
        let spectrum = analyzer.analyze(&mut block).unwrap();
        assert!(spectrum.iter().all(|m| *m == 0.0));
    }

    #[test]
    fn magnitudes_are_scaled_by_block_length() {
        // A DC signal of 1.0 through a rectangle window puts everything in
        // bin 0: |sum| * 100 / n == 100
        let n = 147;
        let mut analyzer = Analyzer::new(n, WindowFunction::Rectangle);
        let mut block = vec![1.0; n];
        let spectrum = analyzer.analyze(&mut block).unwrap();
        assert!((spectrum[0] - 100.0).abs() < 1e-9);
    }
}
