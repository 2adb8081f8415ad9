//! Arc data: the built-in demo set and loading from JSON/TOML files

use super::points::{valid_arcs, Arc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Arc palette for the demo set.
pub const ARC_COLORS: [&str; 3] = ["#06b6d4", "#3b82f6", "#6366f1"];

/// (order, start, end, altitude) for the demo connections.
const SAMPLE: [(i32, (f64, f64), (f64, f64), f64); 40] = [
    (1, (-19.885592, -43.951191), (-22.9068, -43.1729), 0.1),
    (1, (28.6139, 77.209), (3.139, 101.6869), 0.2),
    (1, (-19.885592, -43.951191), (-1.303396, 36.852443), 0.5),
    (2, (1.3521, 103.8198), (35.6762, 139.6503), 0.2),
    (2, (51.5072, -0.1276), (3.139, 101.6869), 0.3),
    (2, (-15.785493, -47.909029), (36.162809, -115.119411), 0.3),
    (3, (-33.8688, 151.2093), (22.3193, 114.1694), 0.3),
    (3, (21.3099, -157.8581), (40.7128, -74.006), 0.3),
    (3, (-6.2088, 106.8456), (51.5072, -0.1276), 0.3),
    (4, (11.986597, 8.571831), (-15.595412, -56.05918), 0.5),
    (4, (-34.6037, -58.3816), (22.3193, 114.1694), 0.7),
    (4, (51.5072, -0.1276), (48.8566, -2.3522), 0.1),
    (5, (14.5995, 120.9842), (51.5072, -0.1276), 0.3),
    (5, (1.3521, 103.8198), (-33.8688, 151.2093), 0.2),
    (5, (34.0522, -118.2437), (48.8566, -2.3522), 0.2),
    (6, (-15.432563, 28.315853), (1.094136, -63.34546), 0.7),
    (6, (37.5665, 126.978), (35.6762, 139.6503), 0.1),
    (6, (22.3193, 114.1694), (51.5072, -0.1276), 0.3),
    (7, (-19.885592, -43.951191), (-15.595412, -56.05918), 0.1),
    (7, (48.8566, -2.3522), (52.52, 13.405), 0.1),
    (7, (52.52, 13.405), (34.0522, -118.2437), 0.2),
    (8, (-8.833221, 13.264837), (-33.936138, 18.436529), 0.2),
    (8, (49.2827, -123.1207), (52.3676, 4.9041), 0.2),
    (8, (1.3521, 103.8198), (40.7128, -74.006), 0.5),
    (9, (51.5072, -0.1276), (34.0522, -118.2437), 0.2),
    (9, (22.3193, 114.1694), (-22.9068, -43.1729), 0.7),
    (9, (1.3521, 103.8198), (-34.6037, -58.3816), 0.5),
    (10, (-22.9068, -43.1729), (28.6139, 77.209), 0.7),
    (10, (34.0522, -118.2437), (31.2304, 121.4737), 0.3),
    (10, (-6.2088, 106.8456), (52.3676, 4.9041), 0.3),
    (11, (41.9028, 12.4964), (34.0522, -118.2437), 0.2),
    (11, (-6.2088, 106.8456), (31.2304, 121.4737), 0.2),
    (11, (22.3193, 114.1694), (1.3521, 103.8198), 0.2),
    (12, (34.0522, -118.2437), (37.7749, -122.4194), 0.1),
    (12, (35.6762, 139.6503), (22.3193, 114.1694), 0.2),
    (12, (22.3193, 114.1694), (34.0522, -118.2437), 0.3),
    (13, (52.52, 13.405), (22.3193, 114.1694), 0.3),
    (13, (11.986597, 8.571831), (35.6762, 139.6503), 0.3),
    (13, (-22.9068, -43.1729), (-34.6037, -58.3816), 0.1),
    (14, (-33.936138, 18.436529), (21.395643, 39.883798), 0.3),
];

/// The demo arcs, each colored from [`ARC_COLORS`].
pub fn sample_arcs(rng: &mut StdRng) -> Vec<Arc> {
    SAMPLE
        .iter()
        .map(|&(order, start, end, alt)| {
            let color = ARC_COLORS.choose(rng).copied().unwrap_or(ARC_COLORS[0]);
            Arc::new(order, start, end, alt, color)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid TOML in {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{} has no arc list", .path.display())]
    MissingArcs { path: PathBuf },
}

/// Load arcs from `path`. `.toml` files hold `[[arcs]]` tables; anything
/// else is read as JSON, either a bare array or `{ "arcs": [...] }`.
///
/// Entries that fail to deserialize or carry impossible coordinates are
/// dropped with a warning rather than failing the whole file.
pub fn load_arcs(path: &Path) -> Result<Vec<Arc>, DataError> {
    let text = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let arcs = if is_toml {
        parse_toml(&text, path)?
    } else {
        parse_json(&text, path)?
    };
    tracing::info!(path = %path.display(), count = arcs.len(), "loaded arcs");
    Ok(valid_arcs(&arcs))
}

fn parse_json(text: &str, path: &Path) -> Result<Vec<Arc>, DataError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let entries = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("arcs") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(DataError::MissingArcs { path: path.to_path_buf() }),
        },
        _ => return Err(DataError::MissingArcs { path: path.to_path_buf() }),
    };
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value::<Arc>(entry) {
            Ok(arc) => Some(arc),
            Err(err) => {
                tracing::warn!(index = i, %err, "skipping arc entry");
                None
            }
        })
        .collect())
}

fn parse_toml(text: &str, path: &Path) -> Result<Vec<Arc>, DataError> {
    let mut table: toml::Table = toml::from_str(text).map_err(|source| DataError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(toml::Value::Array(entries)) = table.remove("arcs") else {
        return Err(DataError::MissingArcs { path: path.to_path_buf() });
    };
    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match entry.try_into::<Arc>() {
            Ok(arc) => Some(arc),
            Err(err) => {
                tracing::warn!(index = i, %err, "skipping arc entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::io::Write;

    fn temp_file(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("termglobe-{}-{name}", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn sample_set_is_complete_and_valid() {
        let mut rng = StdRng::seed_from_u64(9);
        let arcs = sample_arcs(&mut rng);
        assert_eq!(arcs.len(), 40);
        assert!(arcs.iter().all(Arc::is_valid));
        assert!(arcs.iter().all(|a| ARC_COLORS.contains(&a.color.as_str())));
        assert_eq!(arcs[0].order, 1);
        assert_eq!(arcs[39].order, 14);
    }

    #[test]
    fn json_array_with_camel_case_fields() {
        let path = temp_file(
            "arcs.json",
            r##"[
                {"order": 2, "startLat": 1.5, "startLng": 2.5, "endLat": -3.0, "endLng": 4.0,
                 "arcAlt": 0.4, "color": "#ff0000", "startTitle": "Origin"},
                {"startLat": 10, "startLng": 20, "endLat": 30, "endLng": 40},
                {"startLat": 10, "endLat": 30, "endLng": 40},
                {"startLat": 120, "startLng": 20, "endLat": 30, "endLng": 40}
            ]"##,
        );
        let arcs = load_arcs(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(arcs.len(), 2);
        assert_eq!(arcs[0].order, 2);
        assert_eq!(arcs[0].start_title.as_deref(), Some("Origin"));
        assert_eq!(arcs[1].arc_alt, 0.1);
        assert_eq!(arcs[1].color, "#ffffff");
    }

    #[test]
    fn json_object_wrapper() {
        let path = temp_file(
            "wrapped.json",
            r#"{"arcs": [{"startLat": 1, "startLng": 2, "endLat": 3, "endLng": 4}]}"#,
        );
        let arcs = load_arcs(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(arcs.len(), 1);
    }

    #[test]
    fn toml_arc_tables() {
        let path = temp_file(
            "arcs.toml",
            "[[arcs]]\norder = 3\nstartLat = 51.5\nstartLng = -0.12\nendLat = 48.85\nendLng = 2.35\narcAlt = 0.1\ncolor = \"#6366f1\"\n",
        );
        let arcs = load_arcs(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].order, 3);
        assert_eq!(arcs[0].color, "#6366f1");
    }

    #[test]
    fn errors_name_the_problem() {
        let missing = load_arcs(Path::new("/nonexistent/termglobe/arcs.json")).unwrap_err();
        assert!(matches!(missing, DataError::Io { .. }));

        let path = temp_file("broken.json", "{ not json");
        let broken = load_arcs(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(broken, DataError::Json { .. }));
        assert!(broken.to_string().contains("invalid JSON"));

        let path = temp_file("empty.toml", "title = \"nothing\"\n");
        let empty = load_arcs(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(empty, DataError::MissingArcs { .. }));
    }
}
