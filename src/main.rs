mod colors;
mod config;
mod globe;
mod help;
mod settings;
mod terminal;

use clap::{Parser, Subcommand};
use config::{GlobeConfig, RunConfig, Variant};
use globe::country::default_resolver;
use globe::pins::{select_pins, DEFAULT_MAX_PINS};
use globe::points::dedup_points;
use globe::projection::SphereProjector;
use globe::rings::RING_INTERVAL;
use settings::Settings;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "termglobe")]
#[command(version = "0.1.0")]
#[command(about = "termglobe: an interactive braille globe with arcs, rings and hoverable pins", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive globe
    Globe {
        /// Presentation: label, card, tilted
        #[arg(long)]
        variant: Option<String>,

        /// Arc data file (.json or .toml)
        #[arg(short, long)]
        arcs: Option<PathBuf>,

        /// Random seed for reproducibility
        #[arg(short, long)]
        seed: Option<u64>,

        /// Animation speed (seconds per frame)
        #[arg(short, long, default_value = "0.03", value_parser = parse_time_step)]
        time: f32,

        /// Maximum number of pins
        #[arg(short, long)]
        max_pins: Option<usize>,

        /// Keep the globe turning
        #[arg(long)]
        autorotate: bool,

        /// Print one frame to stdout (no interactive display)
        #[arg(short, long)]
        print: bool,
    },

    /// List the unique points of the arc data and which of them get pins
    Points {
        /// Arc data file (.json or .toml)
        #[arg(short, long)]
        arcs: Option<PathBuf>,

        /// Maximum number of pins
        #[arg(short, long)]
        max_pins: Option<usize>,
    },
}

/// Log to a file under the cache dir so nothing lands on the alternate screen.
fn init_logging() {
    let dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir).join("termglobe");
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("termglobe.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_env("TERMGLOBE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn parse_time_step(s: &str) -> Result<f32, String> {
    let step: f32 = s.parse().map_err(|err| format!("{err}"))?;
    if !step.is_finite() || step < 0.0 {
        return Err(format!("expected a non-negative number of seconds, got {s}"));
    }
    Ok(step)
}

fn time_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn resolve_variant(cli: Option<String>, settings: Option<&str>) -> Variant {
    let Some(name) = cli.or_else(|| settings.map(str::to_string)) else {
        return Variant::Label;
    };
    Variant::parse(&name).unwrap_or_else(|| {
        eprintln!("Unknown variant: {}. Using label.", name);
        eprintln!("Available: label, card, tilted");
        Variant::Label
    })
}

fn main() -> io::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let settings = Settings::load();
    let mut globe_config = GlobeConfig::default();
    settings.globe.apply(&mut globe_config);

    match cli.command {
        Commands::Globe {
            variant,
            arcs,
            seed,
            time,
            max_pins,
            autorotate,
            print,
        } => {
            let seed = seed.unwrap_or_else(time_seed);
            let config = RunConfig {
                variant: resolve_variant(variant, settings.globe.variant.as_deref()),
                time_step: time,
                seed: Some(seed),
                max_pins: max_pins.or(settings.globe.max_pins).unwrap_or(DEFAULT_MAX_PINS),
                arcs_file: arcs.or_else(|| settings.globe.arcs_file.clone()),
                autorotate: if autorotate { Some(true) } else { settings.globe.autorotate },
                print,
                ring_interval: settings
                    .globe
                    .ring_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(RING_INTERVAL),
                globe: globe_config,
            };
            let data = match globe::initial_arcs(&config) {
                Ok(data) => data,
                Err(err) => {
                    eprintln!("termglobe: {}", err);
                    std::process::exit(1);
                }
            };
            globe::run(config, data)?;
        }
        Commands::Points { arcs, max_pins } => {
            let config = RunConfig {
                variant: Variant::Label,
                time_step: 0.0,
                // Demo colors are random; a fixed seed keeps the listing stable.
                seed: Some(0),
                max_pins: max_pins.or(settings.globe.max_pins).unwrap_or(DEFAULT_MAX_PINS),
                arcs_file: arcs.or_else(|| settings.globe.arcs_file.clone()),
                autorotate: None,
                print: true,
                ring_interval: RING_INTERVAL,
                globe: globe_config,
            };
            let data = match globe::initial_arcs(&config) {
                Ok(data) => data,
                Err(err) => {
                    eprintln!("termglobe: {}", err);
                    std::process::exit(1);
                }
            };
            print_points(&config, &data);
        }
    }

    Ok(())
}

fn print_points(config: &RunConfig, arcs: &[globe::points::Arc]) {
    let resolver = default_resolver();
    let points = dedup_points(arcs, resolver.as_ref());
    let pins = select_pins(&points, &SphereProjector::default(), config.max_pins);
    let pinned = |lat: f64, lng: f64| pins.iter().any(|m| m.lat == lat && m.lng == lng);

    println!("{} unique points from {} arcs", points.len(), arcs.len());
    println!("pin  {:>10}  {:>11}  {:<24}  title", "lat", "lng", "country");
    for point in &points {
        println!(
            "{:^3}  {:>10.4}  {:>11.4}  {:<24}  {}",
            if pinned(point.lat, point.lng) { "*" } else { "" },
            point.lat,
            point.lng,
            point.country,
            point.title
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_step_must_be_finite_and_non_negative() {
        assert_eq!(parse_time_step("0.05"), Ok(0.05));
        assert_eq!(parse_time_step("0"), Ok(0.0));
        assert!(parse_time_step("inf").is_err());
        assert!(parse_time_step("NaN").is_err());
        assert!(parse_time_step("-1").is_err());
        assert!(parse_time_step("fast").is_err());
    }
}
