//! mapflyer
//!
//! One-shot flyer generator for a neighborhood event: resolves a KMZ/KML
//! address map, fetches a static map image with one marker per address,
//! renders QR codes for the event links, and lays everything out on an A4
//! PDF next to the sorted address list.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mapflyer_core::{extract_addresses, extract_coordinates, Resolver};
use mapflyer_render::{AddressLayout, EmbeddedImage, Flyer};

mod config;
mod map;

use config::{FlyerConfig, Secrets};

/// Scale from requested map pixels to page points.
const MAP_PT_PER_PIXEL: f32 = 0.6;

/// Command-line arguments for the flyer generator
#[derive(Parser, Debug)]
#[command(name = "mapflyer")]
#[command(about = "Generate a printable event flyer from a KMZ/KML address map")]
struct Args {
    /// KMZ or KML input file
    #[arg(short, long, default_value = "data.kmz")]
    input: PathBuf,

    /// Event configuration file (YAML)
    #[arg(short, long, default_value = "flyer.yaml")]
    config: PathBuf,

    /// Secrets file holding the map API key (YAML)
    #[arg(long, default_value = "secrets.yaml")]
    secrets: PathBuf,

    /// Working directory for staged and generated files
    #[arg(long, default_value = "build")]
    build_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = FlyerConfig::from_file(&args.config)?;
    let secrets = Secrets::from_file(&args.secrets)?;

    fs::create_dir_all(&args.build_dir).with_context(|| {
        format!(
            "Failed to create build directory: {}",
            args.build_dir.display()
        )
    })?;

    let mut resolver = Resolver::new(args.build_dir.join("kmz_content"));
    let document = resolver
        .resolve(&args.input)
        .context("Failed to resolve the input document")?;

    let coordinates =
        extract_coordinates(&document).context("Failed to extract coordinates")?;
    let addresses = extract_addresses(&document).context("Failed to extract addresses")?;
    info!(
        coordinates = coordinates.len(),
        addresses = addresses.len(),
        "Extracted placemarks"
    );

    let url = map::map_url(&config.map, &secrets.api_key, &coordinates);
    let map_png = map::fetch_map(&url).context("Failed to fetch the map image")?;
    let map_image = EmbeddedImage::from_png(&map_png)
        .context("Failed to decode the map image")?
        .crop(config.map.crop_margins())
        .context("Failed to crop the map image")?;

    let flyer = Flyer {
        title: config.title.clone(),
        subtitle: config.subtitle.clone(),
        info_lines: config.info_lines.clone(),
        info_link: config.info_link.clone(),
        short_link: config.short_link.clone(),
        map: map_image,
        map_width_pt: config.map.width as f32 * MAP_PT_PER_PIXEL,
        map_height_pt: config.map.height as f32 * MAP_PT_PER_PIXEL,
        addresses,
        highlight: config.highlight.clone(),
        layout: AddressLayout::default(),
    };

    let output = args.build_dir.join(format!("{}.pdf", config.title));
    flyer
        .save(&output)
        .context("Failed to write the flyer PDF")?;
    info!(path = %output.display(), "Flyer complete");

    Ok(())
}
