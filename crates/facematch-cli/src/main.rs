use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facematch_core::crop::{self, FixedRegion};
use facematch_core::{
    encoder, BoundingBox, Classification, EuclideanMatcher, Gallery, Label, OnnxEmbedder, Session,
};
use image::RgbImage;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod manifest;
mod repl;

use config::Config;
use engine::EngineHandle;
use manifest::GalleryManifest;
use repl::{parse_bbox, ReplCommand};

#[derive(Parser)]
#[command(name = "facematch", about = "Identify faces against an in-memory gallery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a face crop and print tensor statistics
    Encode {
        image: PathBuf,
        /// Face region as x,y,width,height (default: whole image)
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BoundingBox>,
    },
    /// Register a gallery manifest, then identify a probe image
    Identify {
        /// TOML manifest listing [[face]] name/image entries
        #[arg(short, long)]
        gallery: PathBuf,
        probe: PathBuf,
        #[arg(long, value_parser = parse_bbox)]
        bbox: Option<BoundingBox>,
        /// Neighbours to report (default: FACEMATCH_TOP_K or 3)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive session: add faces by name and match new photos
    Session {
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Encode { image, bbox } => encode(&image, bbox)?,
        Commands::Identify {
            gallery,
            probe,
            bbox,
            top_k,
            json,
        } => {
            let engine = start_engine(&config, top_k.unwrap_or(config.top_k))?;
            let manifest = GalleryManifest::load(&gallery)?;
            for face in &manifest.faces {
                let face_crop = load_face(&face.image, face.bounding_box())?;
                engine
                    .register(&face.name, face_crop)
                    .await
                    .with_context(|| format!("registering {}", face.name))?;
            }
            tracing::info!(faces = manifest.faces.len(), "gallery registered");

            let result = engine.identify(load_face(&probe, bbox)?).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_classification(&result);
            }
        }
        Commands::Session { top_k } => {
            let engine = start_engine(&config, top_k.unwrap_or(config.top_k))?;
            run_session(engine).await?;
        }
    }

    Ok(())
}

/// Open an image and return the 112x112 crop of its first face.
fn load_face(path: &Path, bbox: Option<BoundingBox>) -> Result<RgbImage> {
    let image = image::open(path).with_context(|| format!("opening image {}", path.display()))?;
    let face = crop::detect_and_crop(&mut FixedRegion::new(bbox), &image)
        .with_context(|| format!("cropping face from {}", path.display()))?;
    Ok(face)
}

fn start_engine(config: &Config, top_k: usize) -> Result<EngineHandle> {
    let model_path = config.embedding_model_path();
    let oracle = OnnxEmbedder::load_with_threads(&model_path, config.intra_threads)
        .with_context(|| format!("loading embedding model {model_path}"))?;
    let matcher = EuclideanMatcher::new(top_k)?;
    let session = Session::new(Gallery::default(), Box::new(matcher));
    Ok(engine::spawn_engine(Box::new(oracle), session)?)
}

fn encode(path: &Path, bbox: Option<BoundingBox>) -> Result<()> {
    let face = load_face(path, bbox)?;
    let tensor = encoder::encode_rgb(&face)?;

    let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
    let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mean = tensor.iter().sum::<f32>() / tensor.len() as f32;

    println!(
        "{}",
        serde_json::json!({
            "image": path.display().to_string(),
            "shape": [1, encoder::INPUT_SIZE, encoder::INPUT_SIZE, encoder::CHANNELS],
            "len": tensor.len(),
            "min": min,
            "max": max,
            "mean": mean,
        })
    );
    Ok(())
}

fn print_classification(result: &Classification) {
    match &result.label {
        Label::NoMatch => println!("no faces registered"),
        label => println!("{label}"),
    }
    let report = result.report();
    if !report.is_empty() {
        println!("{report}");
    }
}

async fn run_session(engine: EngineHandle) -> Result<()> {
    println!("{}", repl::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match repl::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                println!("error: {msg}");
                continue;
            }
        };

        match command {
            ReplCommand::Add { name, image, bbox } => {
                let outcome = match load_face(&image, bbox) {
                    Ok(face) => engine.register(&name, face).await.map_err(anyhow::Error::from),
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(summary) => println!("registered {}", summary.name),
                    Err(err) => println!("error: {err:#}"),
                }
            }
            ReplCommand::Match { image, bbox } => {
                let outcome = match load_face(&image, bbox) {
                    Ok(face) => engine.identify(face).await.map_err(anyhow::Error::from),
                    Err(err) => Err(err),
                };
                match outcome {
                    Ok(result) => print_classification(&result),
                    Err(err) => {
                        tracing::warn!(error = %err, "match skipped");
                        println!("error: {err:#}");
                    }
                }
            }
            ReplCommand::List => {
                let faces = engine.list().await?;
                if faces.is_empty() {
                    println!("no faces registered");
                }
                for (i, face) in faces.iter().enumerate() {
                    println!("{:>3}  {}  {}", i + 1, face.registered_at, face.name);
                }
            }
            ReplCommand::Last => match engine.last().await? {
                Some(result) => print_classification(&result),
                None => println!("nothing matched yet"),
            },
            ReplCommand::Help => println!("{}", repl::HELP),
            ReplCommand::Quit => break,
        }
    }

    tracing::info!("session closed");
    Ok(())
}
