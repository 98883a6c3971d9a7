// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Shardplate CLI

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use shardplate::cli::Reporter;
use shardplate::config::CONFIG_FILE;
use shardplate::pipeline::{export_segment_set, finish_segment_set, generate_suit, oversized_segments, PieceOptions};
use shardplate::{split_object_for_plate, BuildPlate, DetailLevel, DimensionTable, GenerationConfig, PieceKind, Scene, SegmentSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shardplate")]
#[command(about = "Procedural 3D-printable armor with build-plate splitting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate armor pieces as printable STL segments
    Generate {
        /// Configuration file (TOML or JSON); shardplate.toml when present
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pieces to generate, comma separated
        #[arg(short, long, value_delimiter = ',')]
        pieces: Vec<PieceKind>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Surface detail, 0-3
        #[arg(short, long)]
        detail: Option<u8>,

        /// Build plate as XxYxZ in millimetres
        #[arg(long)]
        plate: Option<BuildPlate>,

        /// Dimension table (JSON or TOML)
        #[arg(long)]
        dimensions: Option<PathBuf>,

        /// Keep segments that exceed the build plate whole
        #[arg(long)]
        no_split: bool,

        /// One mesh per piece instead of articulated segments
        #[arg(long)]
        monolithic: bool,

        /// Skip strap mounts
        #[arg(long)]
        no_straps: bool,
    },

    /// Split an existing STL for a build plate
    Split {
        /// Input STL file
        input: PathBuf,

        /// Build plate as XxYxZ in millimetres
        #[arg(long, default_value = "256x256x256")]
        plate: BuildPlate,

        /// Output directory
        #[arg(short, long, default_value = "split")]
        output: PathBuf,

        /// Base segment name; the input file stem by default
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print or write the standard dimension table
    Dimensions {
        /// Output JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Target file
        #[arg(default_value = CONFIG_FILE)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            config,
            pieces,
            output,
            detail,
            plate,
            dimensions,
            no_split,
            monolithic,
            no_straps,
        } => {
            let mut config = match config {
                Some(path) => GenerationConfig::from_file(&path)?,
                None => GenerationConfig::load()?,
            };
            if !pieces.is_empty() {
                config.pieces = pieces;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            if let Some(level) = detail {
                config.detail_level = DetailLevel::try_from(level)?;
            }
            if let Some(plate) = plate {
                config.build_plate = plate;
            }
            if dimensions.is_some() {
                config.dimensions = dimensions;
            }
            config.auto_split &= !no_split;
            config.segmented &= !monolithic;
            config.include_straps &= !no_straps;
            generate_command(&config)
        }
        Commands::Split {
            input,
            plate,
            output,
            name,
        } => split_command(&input, plate, &output, name),
        Commands::Dimensions { output } => dimensions_command(output.as_deref()),
        Commands::InitConfig { path, force } => init_config_command(&path, force),
        Commands::Version => {
            println!("Shardplate v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn generate_command(config: &GenerationConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let table = match &config.dimensions {
        Some(path) => DimensionTable::from_file(path)?,
        None => DimensionTable::standard(),
    };
    Reporter::report_config(config);

    let pb = ProgressBar::new(config.pieces.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let mut scene = Scene::new();
    let reports = generate_suit(&mut scene, config, &table, |report| {
        pb.suspend(|| Reporter::report_piece(report));
        pb.set_message(report.kind.to_string());
        pb.inc(1);
    })
    .context("Armor generation failed")?;
    pb.finish_and_clear();

    Reporter::report_summary(&reports, start.elapsed());
    if reports.iter().any(|r| !r.oversized.is_empty()) {
        Reporter::report_warning("some segments still exceed the build plate; see the log for details");
    }
    Ok(())
}

fn split_command(input: &Path, plate: BuildPlate, output: &Path, name: Option<String>) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }
    plate.validate()?;
    let name = match name {
        Some(name) => name,
        None => input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .context("Cannot derive a segment name from the input path")?,
    };

    let start = Instant::now();
    let mut scene = Scene::new();
    let mesh = scene
        .import_stl(input, &name)
        .with_context(|| format!("Failed to import {}", input.display()))?;
    let leaves = split_object_for_plate(&mut scene, mesh, &plate, &name)?;

    let options = PieceOptions {
        build_plate: plate,
        detail: DetailLevel::Basic,
        ..PieceOptions::default()
    };
    let mut set = SegmentSet::new();
    set.extend(leaves)?;
    let set = finish_segment_set(&mut scene, set, options.detail)?;
    let manifest = export_segment_set(&scene, &set, output, &name, &options)
        .with_context(|| format!("Failed to export segments to {}", output.display()))?;

    for segment in oversized_segments(&scene, &set, &plate)? {
        Reporter::report_warning(&format!("{} still exceeds {}", segment.name(), plate));
    }
    Reporter::success(&format!(
        "{} -> {} segments in {} ({})",
        input.display(),
        manifest.segments.len(),
        output.display(),
        Reporter::format_duration(start.elapsed())
    ));
    Ok(())
}

fn dimensions_command(output: Option<&Path>) -> Result<()> {
    let json = DimensionTable::standard().to_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            Reporter::report_info(&format!("Dimension table written to {}", path.display()));
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn init_config_command(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    GenerationConfig::default().save(path)?;
    Reporter::success(&format!("Configuration written to {}", path.display()));
    Ok(())
}
