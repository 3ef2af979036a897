//! meshport - CLI tool to convert 3D/CAD models into importable COLLADA documents.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use meshport_core::{
    default_output_path, ConversionCounter, FileCounter, FixedPrompter, MemoryCounter, Outcome,
    Pipeline, Settings, ToolPaths, Toolchain, Units,
};

/// Convert 3D/CAD models into COLLADA documents with fixed materials and textures.
#[derive(Parser, Debug)]
#[command(name = "meshport")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input model file path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output COLLADA file path [default: <input stem>-converted.dae]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reduce the mesh to this many faces
    #[arg(short, long)]
    target_faces: Option<u32>,

    /// Skip polygon reduction
    #[arg(long)]
    no_reduction: bool,

    /// Units of the source model (mm, cm, m, in, ft, yd)
    #[arg(short, long)]
    units: Option<Units>,

    /// Texture for a material without one, as MATERIAL=PATH (repeatable)
    #[arg(long = "texture", value_name = "MATERIAL=PATH")]
    textures: Vec<String>,

    /// Apply the legacy meter="1" scale correction
    #[arg(long)]
    legacy_unit_fix: bool,

    /// Keep the working files next to the source
    #[arg(long)]
    keep_files: bool,

    /// Print the conversion report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_texture(arg: &str) -> Result<(String, PathBuf)> {
    let (material, path) = arg
        .split_once('=')
        .with_context(|| format!("Expected MATERIAL=PATH, got {}", arg))?;
    Ok((material.to_string(), PathBuf::from(path)))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings {}", path.display()))?,
        None => Settings {
            tools: ToolPaths::from_env(),
            ..Settings::default()
        },
    };

    // Command line overrides the settings file
    let options = &mut settings.options;
    if args.target_faces.is_some() {
        options.target_face_count = args.target_faces;
    }
    if args.no_reduction {
        options.propose_reduction = false;
    }
    if args.units.is_some() {
        options.units = args.units;
    }
    if args.legacy_unit_fix {
        options.legacy_unit_fix = true;
    }

    let target = if options.propose_reduction {
        options.target_face_count
    } else {
        None
    };
    let mut prompter = FixedPrompter::new(target);
    for arg in &args.textures {
        let (material, path) = parse_texture(arg)?;
        prompter = prompter.with_texture(material, path);
    }
    if !prompter.textures.is_empty() {
        options.claim_missing_textures = true;
    }

    let mut counter: Box<dyn ConversionCounter> = match &settings.counter_file {
        Some(path) => Box::new(FileCounter::new(path)),
        None => Box::new(MemoryCounter::default()),
    };

    let toolchain = Toolchain::new(&settings.tools);
    let outcome = Pipeline::new(&toolchain, &settings.options).convert(
        args.input.as_deref(),
        &mut prompter,
        counter.as_mut(),
    );

    let conversion = match outcome {
        Outcome::Cancelled => {
            info!("Nothing to convert");
            return Ok(());
        }
        Outcome::Failed(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            error!("{}", report);
            std::process::exit(1);
        }
        Outcome::Completed(conversion) => conversion,
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(conversion.source.path()));
    let exported = match conversion.export(&output_path) {
        Ok(exported) => exported,
        Err(e) => {
            if !args.keep_files {
                (*conversion).release()?;
            }
            return Err(e).with_context(|| format!("Failed to write {}", output_path.display()));
        }
    };
    info!("Generated: {}", exported.path.display());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&conversion)?);
    }

    if args.keep_files {
        info!(
            "Working files kept in {}",
            conversion.source.directory().display()
        );
        return Ok(());
    }
    let removed = (*conversion).release()?;
    info!("Removed {} working file(s)", removed);

    Ok(())
}
