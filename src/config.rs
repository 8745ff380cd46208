use crate::gfx::math::Color;
use anyhow::Result;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_window")]
    pub window: Size,

    #[serde(default = "default_triangle_scale")]
    pub triangle_scale: f32,

    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    #[serde(default = "default_dot_radius")]
    pub dot_radius: f32,

    #[serde(default = "default_theme")]
    pub theme: Theme,

    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,

    /// Overrides where the edge durations are stored.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub triangle: String,
    pub dot: String,
    pub field: String,
    pub field_focused: String,
    pub digits: String,
}

impl Default for Theme {
    fn default() -> Self {
        default_theme()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: default_window(),
            triangle_scale: default_triangle_scale(),
            stroke_width: default_stroke_width(),
            dot_radius: default_dot_radius(),
            theme: default_theme(),
            fps_cap: default_fps_cap(),
            storage_path: None,
        }
    }
}

fn default_window() -> Size {
    Size {
        width: 480,
        height: 800,
    }
}

fn default_triangle_scale() -> f32 {
    0.8
}

fn default_stroke_width() -> f32 {
    2.0
}

fn default_dot_radius() -> f32 {
    10.0
}

fn default_theme() -> Theme {
    Theme {
        background: "#f2f2f2".to_string(),
        triangle: "#000000".to_string(),
        dot: "#ff0000".to_string(),
        field: "#ffffff".to_string(),
        field_focused: "#dbe9ff".to_string(),
        digits: "#202020".to_string(),
    }
}

fn default_fps_cap() -> u32 {
    60
}

/// Theme with every colour parsed.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub triangle: Color,
    pub dot: Color,
    pub field: Color,
    pub field_focused: Color,
    pub digits: Color,
}

impl Theme {
    /// Unparseable entries fall back to the default colour.
    pub fn palette(&self) -> Palette {
        let defaults = default_theme();
        let pick = |name: &str, value: &str, fallback: &str| {
            Color::from_hex(value).unwrap_or_else(|| {
                warn!("Invalid {} colour {:?}, using {}", name, value, fallback);
                Color::from_hex(fallback).unwrap_or(Color::rgba(0, 0, 0, 255))
            })
        };

        Palette {
            background: pick("background", &self.background, &defaults.background),
            triangle: pick("triangle", &self.triangle, &defaults.triangle),
            dot: pick("dot", &self.dot, &defaults.dot),
            field: pick("field", &self.field, &defaults.field),
            field_focused: pick("field_focused", &self.field_focused, &defaults.field_focused),
            digits: pick("digits", &self.digits, &defaults.digits),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("trichi").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        if config.fps_cap == 0 {
            warn!("fps_cap must be positive, using {}", default_fps_cap());
            config.fps_cap = default_fps_cap();
        }
        if !(config.triangle_scale > 0.0 && config.triangle_scale <= 1.0) {
            warn!("triangle_scale must be in (0, 1], using {}", default_triangle_scale());
            config.triangle_scale = default_triangle_scale();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.window.width, 480);
        assert_eq!(config.triangle_scale, 0.8);
        assert_eq!(config.dot_radius, 10.0);
        assert_eq!(config.fps_cap, 60);
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn partial_theme_keeps_other_colours() {
        let config = Config::from_toml("[theme]\ndot = \"#00ff00\"\n").unwrap();
        let palette = config.theme.palette();
        assert_eq!(palette.dot, Color::rgba(0, 255, 0, 255));
        assert_eq!(palette.triangle, Color::rgba(0, 0, 0, 255));
    }

    #[test]
    fn bad_values_are_replaced() {
        let config = Config::from_toml("fps_cap = 0\ntriangle_scale = 3.0\n").unwrap();
        assert_eq!(config.fps_cap, 60);
        assert_eq!(config.triangle_scale, 0.8);

        let config = Config::from_toml("[theme]\ndot = \"red\"\n").unwrap();
        assert_eq!(config.theme.palette().dot, Color::rgba(255, 0, 0, 255));
    }

    #[test]
    fn storage_path_override() {
        let config = Config::from_toml("storage_path = \"/tmp/speeds.toml\"\n").unwrap();
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/speeds.toml")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_toml("fps_cap = \"fast\"").is_err());
    }
}
