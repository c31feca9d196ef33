use palette::Srgb;

/// How one history layer is rendered. Styles are keyed by the absolute frame
/// number modulo the layer count, not by recency, so the colors cycle as the
/// session advances and the newest layer is not always the same color.
#[derive(Clone, Debug)]
pub struct LayerStyle {
    pub color: Srgb<u8>,
    pub exponent: f64,
    pub smoothing: usize,
}

/// Per-layer scratch buffers, allocated once on first use and then reused for
/// the rest of the session. `smoothed` and `points` are overwritten whenever
/// the layer is refreshed or drawn.
pub struct LayerCache {
    pub raw: Vec<f64>,
    pub smoothed: Vec<f64>,
    pub points: Vec<(f32, f32)>,
}

impl LayerCache {
    fn new(len: usize) -> LayerCache {
        LayerCache {
            raw: vec![0.0; len],
            smoothed: vec![0.0; len],
            points: vec![(0.0, 0.0); len],
        }
    }
}

/// A rotating history of the last `styles.len()` spectra. Slots are addressed
/// by frame number modulo the layer count and overwritten in place forever;
/// nothing is ever evicted.
pub struct SpectrumHistory {
    styles: Vec<LayerStyle>,
    slots: Vec<LayerCache>,
    frame: u64,
}

impl SpectrumHistory {
    pub fn new(styles: Vec<LayerStyle>) -> SpectrumHistory {
        let capacity = styles.len();
        SpectrumHistory {
            styles,
            slots: Vec::with_capacity(capacity),
            frame: 0,
        }
    }

    pub fn layer_count(&self) -> usize {
        self.styles.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn style(&self, idx: usize) -> &LayerStyle {
        &self.styles[idx]
    }

    pub fn slot(&self, idx: usize) -> &LayerCache {
        &self.slots[idx]
    }

    pub fn slot_mut(&mut self, idx: usize) -> &mut LayerCache {
        &mut self.slots[idx]
    }

    /// Stores the spectrum in the slot for the current frame, smooths it with
    /// the slot style's margin and returns the frame number it was assigned.
    pub fn advance(&mut self, spectrum: &[f64]) -> u64 {
        let count = self.styles.len();
        let slot = (self.frame % count as u64) as usize;
        if self.slots.len() <= slot {
            self.slots.push(LayerCache::new(spectrum.len()));
        }

        self.slots[slot].raw.copy_from_slice(spectrum);
        let margin = self.styles[slot].smoothing;
        Self::smooth(&mut self.slots[slot], margin);

        let frame = self.frame;
        self.frame += 1;
        frame
    }

    /// Boundary-truncating moving average. The window shrinks at the array
    /// edges instead of wrapping, and the center term is counted twice at
    /// j == 0; the rendered curves depend on that exact weighting, so it
    /// stays bit-for-bit as is.
    fn smooth(cache: &mut LayerCache, margin: usize) {
        let len = cache.raw.len();
        for i in 0..len {
            let mut sum = 0.0;
            let mut denom = 0.0;
            for j in 0..margin {
                if i < j || i + j > len - 1 {
                    break;
                }
                sum += cache.raw[i - j] + cache.raw[i + j];
                denom += (margin - j + 1) as f64 * 2.0;
            }
            cache.smoothed[i] = if denom > 0.0 { sum / denom } else { 0.0 };
        }
    }
}
