use std::path::Path;

use config_file::FromConfigFile;
use palette::Srgb;
use serde::Deserialize;

use crate::audiosource::SAMPLE_RATE;
use crate::spectrumhistory::LayerStyle;
use crate::windowfunction::WindowFunction;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ffmpeg: String,
    pub fps: usize,
    pub width: u32,
    pub height: u32,
    pub window: WindowFunction,
    /// Radius of the inner circle as a fraction of the canvas height
    pub base_radius: f64,
    /// Scale applied to spectrum magnitudes before the per-layer exponent
    pub height_multiplier: f64,
    pub video_codec: Vec<String>,
    pub audio_codec: Vec<String>,
    pub layers: Vec<LayerConfig>,
}

#[derive(Clone, Deserialize)]
pub struct LayerConfig {
    /// Hex color, e.g. "#33ccff"
    pub color: String,
    pub exponent: f64,
    pub smoothing: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            ffmpeg: "ffmpeg".to_string(),
            fps: 30,
            width: 1280,
            height: 720,
            window: WindowFunction::default(),
            base_radius: 0.25,
            height_multiplier: 8.0,
            video_codec: ["libx264", "-preset", "ultrafast", "-crf", "0"]
                .map(String::from)
                .to_vec(),
            audio_codec: vec!["copy".to_string()],
            layers: default_layers(),
        }
    }
}

// Layers are drawn oldest to newest, so this table reads oldest to newest as
// well: the style cycle ends on plain white for the freshest spectrum.
fn default_layers() -> Vec<LayerConfig> {
    [
        ("#00ff00", 1.52, 5), // green
        ("#33ccff", 1.50, 5), // lightblue
        ("#0000ff", 1.36, 3), // blue
        ("#333399", 1.33, 3), // indigo
        ("#ff66ff", 1.30, 3), // pink
        ("#ff0000", 1.14, 2), // red
        ("#ffff00", 1.12, 2), // yellow
        ("#ffffff", 1.00, 1),
    ]
    .iter()
    .map(|(color, exponent, smoothing)| LayerConfig {
        color: color.to_string(),
        exponent: *exponent,
        smoothing: *smoothing,
    })
    .collect()
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let config = match path {
            Some(path) => Config::from_config_file(path)
                .map_err(|error| format!("{}: {:?}", path.display(), error))?,
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.fps == 0 || self.fps > SAMPLE_RATE {
            return Err(format!("Frame rate out of range: {}", self.fps));
        }
        if self.width == 0 || self.height == 0 {
            return Err(format!("Invalid canvas size: {}x{}", self.width, self.height));
        }
        if self.layers.is_empty() {
            return Err("At least one layer style is required".to_string());
        }
        if self.base_radius <= 0.0 {
            return Err(format!("Base radius fraction must be positive: {}", self.base_radius));
        }
        Ok(())
    }

    pub fn samples_per_block(&self) -> usize {
        SAMPLE_RATE / self.fps
    }

    /// Resolves the layer table into runtime styles, parsing the hex colors.
    pub fn layer_styles(&self) -> Result<Vec<LayerStyle>, String> {
        self.layers
            .iter()
            .map(|layer| {
                let color = layer
                    .color
                    .parse::<Srgb<u8>>()
                    .map_err(|error| format!("Bad layer color {:?}: {}", layer.color, error))?;
                if layer.exponent <= 0.0 {
                    return Err(format!("Layer exponent must be positive: {}", layer.exponent));
                }
                Ok(LayerStyle {
                    color,
                    exponent: layer.exponent,
                    smoothing: layer.smoothing,
                })
            })
            .collect()
    }
}
