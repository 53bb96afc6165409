use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn, Level};
use tracing_subscriber;

use track_aligner::audio::AudioLoader;
use track_aligner::{AlignmentEngine, Config, Track};

#[derive(Parser)]
#[command(
    name = "track-aligner",
    version,
    about = "Compare recordings of a song and recover their time offset",
    long_about = "Track-Aligner analyzes the rhythm content of audio recordings, scores how similar two of them are and estimates how far apart in time they start. Decoded samples are cached alongside the audio so repeated comparisons stay fast."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for cache entries (defaults to each file's parent)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single track and print its rhythm features
    Info {
        /// Audio file to analyze
        track: PathBuf,
    },

    /// Compare two tracks: similarity score and start offset
    Compare {
        /// First audio file
        track_a: PathBuf,

        /// Second audio file
        track_b: PathBuf,
    },

    /// Rank candidate recordings by similarity to a reference
    Match {
        /// Reference audio file
        reference: PathBuf,

        /// Candidate audio files, or directories to scan for them
        #[arg(required = true)]
        candidates: Vec<PathBuf>,

        /// Worker threads (defaults to all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Track-Aligner v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    let output_dir = cli.output_dir.as_deref();

    let outcome = match cli.command {
        Command::Info { track } => run_info(&track, output_dir, &config),
        Command::Compare { track_a, track_b } => {
            run_compare(&track_a, &track_b, output_dir, config)
        }
        Command::Match {
            reference,
            candidates,
            jobs,
        } => run_match(&reference, &candidates, jobs, output_dir, config),
    };

    if let Err(e) = outcome {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}

fn run_info(
    track_path: &Path,
    output_dir: Option<&Path>,
    config: &Config,
) -> track_aligner::Result<()> {
    let track = Track::open(track_path, output_dir, config)?;

    println!("Track:    {}", track.name());
    println!("Source:   {}", track.source_path().display());
    println!("Duration: {:.2} s", track.duration());
    println!("Rate:     {} Hz", track.sample_rate());
    println!("Frames:   {}", track.onset_envelope().len());
    if track.tempo() > 0.0 {
        println!(
            "Tempo:    {:.1} BPM ({} beats tracked)",
            track.tempo(),
            track.beat_frames().len()
        );
    } else {
        println!("Tempo:    no stable estimate");
    }

    track.close()
}

fn run_compare(
    path_a: &Path,
    path_b: &Path,
    output_dir: Option<&Path>,
    config: Config,
) -> track_aligner::Result<()> {
    let a = Track::open(path_a, output_dir, &config)?;
    let b = Track::open(path_b, output_dir, &config)?;

    let engine = AlignmentEngine::new(config);
    let result = engine.compare(&a, &b)?;

    println!("{} vs {}", result.track_a, result.track_b);
    println!("  Similarity: {:.3}", result.similarity);
    println!(
        "  Offset:     {:.3} s ({} frames)",
        result.offset_seconds, result.lag_frames
    );

    a.close()?;
    b.close()
}

fn run_match(
    reference_path: &Path,
    candidates: &[PathBuf],
    jobs: Option<usize>,
    output_dir: Option<&Path>,
    config: Config,
) -> track_aligner::Result<()> {
    let jobs = jobs.unwrap_or_else(num_cpus::get);
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
    {
        debug!("Thread pool already initialized: {e}");
    }

    let candidates = collect_candidates(candidates)?;
    let reference = Track::open(reference_path, output_dir, &config)?;
    let engine = AlignmentEngine::new(config);
    let outcomes = engine.match_against(&reference, &candidates);

    println!("Matches for {}:", reference.name());
    for (name, outcome) in &outcomes {
        match outcome {
            Ok(result) => println!(
                "  {:<32} similarity {:.3}, offset {:.3} s",
                name, result.similarity, result.offset_seconds
            ),
            Err(e) => println!("  {:<32} skipped: {}", name, e.user_message()),
        }
    }

    reference.close()
}

/// Expand candidate arguments: files pass through untouched, directories
/// contribute their supported audio files in name order
fn collect_candidates(args: &[PathBuf]) -> track_aligner::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for arg in args {
        if !arg.is_dir() {
            paths.push(arg.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in std::fs::read_dir(arg)? {
            let path = entry?.path();
            let supported = AudioLoader::detect_format(&path)
                .map(|ext| AudioLoader::is_format_supported(&ext))
                .unwrap_or(false);
            if path.is_file() && supported {
                found.push(path);
            }
        }

        if found.is_empty() {
            warn!("No supported audio files in {:?}", arg);
        }
        found.sort();
        paths.append(&mut found);
    }

    Ok(paths)
}
