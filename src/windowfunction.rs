use std::f64::consts::PI;
use std::str::FromStr;

use serde::Deserialize;

/// The classic scalar window functions, applied to a sample block before the
/// frequency transform. All of them are symmetric: w(i, s) == w(s - 1 - i, s).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    Rectangle,
    Hamming,
    Hann,
}

impl WindowFunction {
    pub fn weight(&self, i: usize, s: usize) -> f64 {
        let phase = 2.0 * PI * i as f64 / (s - 1) as f64;
        match self {
            WindowFunction::Rectangle => 1.0,
            WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
            WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
        }
    }
}

impl Default for WindowFunction {
    fn default() -> WindowFunction {
        WindowFunction::Hamming
    }
}

impl FromStr for WindowFunction {
    type Err = String;

    fn from_str(name: &str) -> Result<WindowFunction, String> {
        match name {
            "rectangle" => Ok(WindowFunction::Rectangle),
            "hamming" => Ok(WindowFunction::Hamming),
            "hann" => Ok(WindowFunction::Hann),
            _ => Err(format!("Unknown window function: {}", name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FUNCTIONS: [WindowFunction; 3] = [
        WindowFunction::Rectangle,
        WindowFunction::Hamming,
        WindowFunction::Hann,
    ];

    #[test]
    fn windows_are_symmetric() {
        let s = 1470;
        for function in FUNCTIONS {
            for i in 0..s {
                let left = function.weight(i, s);
                let right = function.weight(s - 1 - i, s);
                assert!(
                    (left - right).abs() < 1e-12,
                    "{:?} not symmetric at {}: {} vs {}",
                    function,
                    i,
                    left,
                    right
                );
            }
        }
    }

    #[test]
    fn rectangle_is_unity() {
        for i in 0..64 {
            assert_eq!(WindowFunction::Rectangle.weight(i, 64), 1.0);
        }
    }

    #[test]
    fn hamming_endpoints() {
        // 0.54 - 0.46 at both ends, peak of 1.0 in the middle
        let s = 1001;
        assert!((WindowFunction::Hamming.weight(0, s) - 0.08).abs() < 1e-12);
        assert!((WindowFunction::Hamming.weight(s - 1, s) - 0.08).abs() < 1e-12);
        assert!((WindowFunction::Hamming.weight((s - 1) / 2, s) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parses_by_name() {
        assert_eq!("hann".parse::<WindowFunction>(), Ok(WindowFunction::Hann));
        assert!("blackman".parse::<WindowFunction>().is_err());
    }
}
