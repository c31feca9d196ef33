use std::f64::consts::PI;

use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

use crate::spectrumhistory::SpectrumHistory;

/// Draws the layered circular spectrum into an RGBA raster.
///
/// Each layer's smoothed spectrum becomes a closed curve: polar points on the
/// right half of the circle, quadratic interpolation through the midpoints,
/// then the same point set mirrored in x for the left half. Layers are filled
/// oldest to newest so recent frames occlude older ones, and a solid circle
/// covers the inner region last.
pub struct PathComposer {
    pixmap: Pixmap,
    base_radius: f64,
    height_multiplier: f64,
    background: Color,
    overlay: Color,
}

impl PathComposer {
    pub fn new(
        width: u32,
        height: u32,
        base_radius_fraction: f64,
        height_multiplier: f64,
    ) -> Result<PathComposer, String> {
        let pixmap = match Pixmap::new(width, height) {
            Some(pixmap) => pixmap,
            None => return Err(format!("Invalid canvas dimensions: {}x{}", width, height)),
        };

        Ok(PathComposer {
            pixmap,
            base_radius: height as f64 * base_radius_fraction,
            height_multiplier,
            background: Color::BLACK,
            overlay: Color::WHITE,
        })
    }

    /// Bytes per composited frame: width * height * 4 (interleaved RGBA).
    pub fn frame_size(&self) -> usize {
        self.pixmap.data().len()
    }

    /// Composites every eligible history layer for `frame` and returns the
    /// raster bytes, valid until the next call.
    pub fn render(&mut self, history: &mut SpectrumHistory, frame: u64) -> &[u8] {
        self.pixmap.fill(self.background);

        let cx = self.pixmap.width() as f32 / 2.0;
        let cy = self.pixmap.height() as f32 / 2.0;
        let count = history.layer_count() as i64;

        for s in 0..count {
            // the frame that was current (count - 1 - s) frames ago
            let x = frame as i64 - (count - 1) + s;
            if x < 0 {
                // not enough history yet, we must be starting up
                continue;
            }

            let idx = (x % count) as usize;
            let exponent = history.style(idx).exponent;
            let color = history.style(idx).color;
            let base_radius = self.base_radius;
            let height_multiplier = self.height_multiplier;

            let cache = history.slot_mut(idx);
            Self::plot_points(
                &cache.smoothed,
                exponent,
                base_radius,
                height_multiplier,
                &mut cache.points,
            );
            let path = match Self::build_path(&cache.points, cx, cy) {
                Some(path) => path,
                None => continue,
            };

            let mut paint = Paint::default();
            paint.set_color_rgba8(color.red, color.green, color.blue, 255);
            paint.anti_alias = true;
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }

        if let Some(circle) = PathBuilder::from_circle(cx, cy, self.base_radius as f32) {
            let mut paint = Paint::default();
            paint.set_color(self.overlay);
            paint.anti_alias = true;
            self.pixmap
                .fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);
        }

        self.pixmap.data()
    }

    /// Maps bin i to the angle pi * i / (len - 1) - pi / 2, so the spectrum
    /// sweeps the right half of the circle from bottom to top. The radius
    /// grows non-linearly with the layer's exponent.
    fn plot_points(
        smoothed: &[f64],
        exponent: f64,
        base_radius: f64,
        height_multiplier: f64,
        points: &mut [(f32, f32)],
    ) {
        let len = smoothed.len();
        for i in 0..len {
            let t = PI * (i as f64 / (len - 1) as f64) - PI / 2.0;
            let r = base_radius + (smoothed[i] * height_multiplier).powf(exponent);
            points[i] = ((r * t.cos()) as f32, (r * t.sin()) as f32);
        }
    }

    /// Closed curve through the points: right half as given, left half with x
    /// negated, both smoothed by quadratic segments through each point to the
    /// midpoint of it and its successor. With fewer than three points only
    /// the two explicit end segments remain.
    ///
    /// Points are y-up around the canvas center; the pixmap is y-down, hence
    /// the flipped y when mapping to screen space.
    fn build_path(points: &[(f32, f32)], cx: f32, cy: f32) -> Option<Path> {
        let l = points.len();
        if l < 2 {
            return None;
        }

        let mid = |a: (f32, f32), b: (f32, f32)| ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        let mut pb = PathBuilder::new();

        pb.move_to(cx, cy - points[0].1);
        for j in 1..l.saturating_sub(2) {
            let m = mid(points[j], points[j + 1]);
            pb.quad_to(cx + points[j].0, cy - points[j].1, cx + m.0, cy - m.1);
        }
        pb.quad_to(
            cx + points[l - 2].0,
            cy - points[l - 2].1,
            cx + points[l - 1].0,
            cy - points[l - 1].1,
        );

        // mirror image for the left half
        for j in 1..l.saturating_sub(2) {
            let m = mid(points[j], points[j + 1]);
            pb.quad_to(cx - points[j].0, cy - points[j].1, cx - m.0, cy - m.1);
        }
        pb.quad_to(
            cx - points[l - 2].0,
            cy - points[l - 2].1,
            cx - points[l - 1].0,
            cy - points[l - 1].1,
        );

        pb.close();
        pb.finish()
    }
}
