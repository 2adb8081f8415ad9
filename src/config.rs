use crate::globe::popup::PopupStyle;
use std::f64::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::time::Duration;

/// Look of the globe. Colors are CSS strings (`#rrggbb`, `rgba(...)`).
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeConfig {
    pub point_size: f64,
    pub atmosphere_color: String,
    pub show_atmosphere: bool,
    pub atmosphere_altitude: f64,
    pub polygon_color: String,
    pub globe_color: String,
    pub emissive: String,
    pub emissive_intensity: f64,
    pub shininess: f64,
    /// Arc dash travel time, milliseconds.
    pub arc_time: f64,
    pub arc_length: f64,
    pub rings: f64,
    /// Maximum ring radius, degrees.
    pub max_rings: f64,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            point_size: 1.0,
            atmosphere_color: "#ffffff".to_string(),
            show_atmosphere: true,
            atmosphere_altitude: 0.1,
            polygon_color: "rgba(255,255,255,0.7)".to_string(),
            globe_color: "#1d072e".to_string(),
            emissive: "#000000".to_string(),
            emissive_intensity: 0.1,
            shininess: 0.9,
            arc_time: 2000.0,
            arc_length: 0.9,
            rings: 1.0,
            max_rings: 3.0,
        }
    }
}

impl GlobeConfig {
    /// How often each ring starts a new ripple.
    pub fn ring_repeat_period(&self) -> Duration {
        if self.rings <= 0.0 {
            return Duration::ZERO;
        }
        let ms = self.arc_time * self.arc_length / self.rings;
        Duration::from_millis(ms.max(0.0).round() as u64)
    }
}

/// The three globe presentations, chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Country name popup, level camera.
    Label,
    /// Profile card popup with paging, level camera.
    Card,
    /// Profile card, camera tilted above the equator and orbiting.
    Tilted,
}

/// Everything a [`Variant`] decides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VariantStyle {
    pub popup: PopupStyle,
    pub pin_glyph: char,
    /// Initial camera polar angle, radians from the north pole.
    pub camera_polar: f64,
    pub autorotate: bool,
}

impl Variant {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "label" | "country" => Some(Variant::Label),
            "card" | "profile" => Some(Variant::Card),
            "tilted" | "tilt" => Some(Variant::Tilted),
            _ => None,
        }
    }

    pub fn style(self) -> VariantStyle {
        match self {
            Variant::Label => VariantStyle {
                popup: PopupStyle::CountryLabel,
                pin_glyph: '●',
                camera_polar: FRAC_PI_2,
                autorotate: false,
            },
            Variant::Card => VariantStyle {
                popup: PopupStyle::ProfileCard,
                pin_glyph: '▼',
                camera_polar: FRAC_PI_2,
                autorotate: false,
            },
            Variant::Tilted => VariantStyle {
                popup: PopupStyle::ProfileCard,
                pin_glyph: '◆',
                camera_polar: FRAC_PI_2 - 0.3,
                autorotate: true,
            },
        }
    }
}

/// Runtime options for `termglobe globe`, after CLI and settings are merged.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub variant: Variant,
    pub time_step: f32,
    pub seed: Option<u64>,
    pub max_pins: usize,
    pub arcs_file: Option<PathBuf>,
    pub autorotate: Option<bool>,
    pub print: bool,
    pub ring_interval: Duration,
    pub globe: GlobeConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_period_follows_arc_timing() {
        let config = GlobeConfig::default();
        assert_eq!(config.ring_repeat_period(), Duration::from_millis(1800));
        let none = GlobeConfig { rings: 0.0, ..GlobeConfig::default() };
        assert_eq!(none.ring_repeat_period(), Duration::ZERO);
    }

    #[test]
    fn variant_names() {
        assert_eq!(Variant::parse("Card"), Some(Variant::Card));
        assert_eq!(Variant::parse("country"), Some(Variant::Label));
        assert_eq!(Variant::parse("tilt"), Some(Variant::Tilted));
        assert_eq!(Variant::parse("spinny"), None);
        assert_eq!(Variant::Label.style().popup, PopupStyle::CountryLabel);
        assert!(Variant::Tilted.style().autorotate);
    }
}
