use crate::config::GlobeConfig;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub globe: GlobeSettings,
}

/// `[globe]` section of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
pub struct GlobeSettings {
    pub arcs_file: Option<PathBuf>,
    pub variant: Option<String>,
    pub max_pins: Option<usize>,
    pub ring_interval_ms: Option<u64>,
    pub autorotate: Option<bool>,
    pub point_size: Option<f64>,
    pub globe_color: Option<String>,
    pub polygon_color: Option<String>,
    pub atmosphere_color: Option<String>,
    pub show_atmosphere: Option<bool>,
    pub atmosphere_altitude: Option<f64>,
    pub emissive: Option<String>,
    pub emissive_intensity: Option<f64>,
    pub arc_time: Option<f64>,
    pub arc_length: Option<f64>,
    pub rings: Option<f64>,
    pub max_rings: Option<f64>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "could not read settings");
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|err| {
            tracing::warn!(%err, "ignoring malformed settings");
            Self::default()
        })
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("termglobe")
            .join("config.toml")
    }
}

impl GlobeSettings {
    /// Overlay the keys present in the file onto `config`.
    pub fn apply(&self, config: &mut GlobeConfig) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        set(&mut config.point_size, &self.point_size);
        set(&mut config.globe_color, &self.globe_color);
        set(&mut config.polygon_color, &self.polygon_color);
        set(&mut config.atmosphere_color, &self.atmosphere_color);
        set(&mut config.show_atmosphere, &self.show_atmosphere);
        set(&mut config.atmosphere_altitude, &self.atmosphere_altitude);
        set(&mut config.emissive, &self.emissive);
        set(&mut config.emissive_intensity, &self.emissive_intensity);
        set(&mut config.arc_time, &self.arc_time);
        set(&mut config.arc_length, &self.arc_length);
        set(&mut config.rings, &self.rings);
        set(&mut config.max_rings, &self.max_rings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_globe_section_overrides_only_given_keys() {
        let settings = Settings::parse(
            r##"
            [globe]
            variant = "card"
            max_pins = 4
            globe_color = "#3B3B3B"
            arc_time = 1000.0
            "##,
        );
        assert_eq!(settings.globe.variant.as_deref(), Some("card"));
        assert_eq!(settings.globe.max_pins, Some(4));

        let mut config = GlobeConfig::default();
        settings.globe.apply(&mut config);
        assert_eq!(config.globe_color, "#3B3B3B");
        assert_eq!(config.arc_time, 1000.0);
        assert_eq!(config.arc_length, GlobeConfig::default().arc_length);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let settings = Settings::parse("[globe\nmax_pins = ");
        assert!(settings.globe.max_pins.is_none());
        assert!(Settings::parse("").globe.variant.is_none());
    }
}
