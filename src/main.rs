use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medleydb::{Dataset, DatasetConfig, MelodyLevel, MultiTrack, Taxonomy, Track};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "medleydb", version, about = "Inspect a MedleyDB-style multitrack dataset")]
struct Cli {
    /// Directory of <track_id>_METADATA.yaml files
    #[arg(long, global = true)]
    metadata_dir: Option<PathBuf>,

    /// Directory of <track_id>_ANNOTATIONS directories
    #[arg(long, global = true)]
    annotation_dir: Option<PathBuf>,

    /// Audio root (overrides MEDLEYDB_PATH and the config file)
    #[arg(long, global = true)]
    audio_dir: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List track ids with a metadata file
    List,

    /// Show a multitrack's metadata summary
    Info {
        track_id: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List a multitrack's stems and raw sources
    Stems { track_id: String },

    /// Summarize a melody annotation
    Melody {
        track_id: String,

        /// Melody definition (1, 2 or 3)
        #[arg(
            short,
            long,
            default_value = "1",
            value_parser = clap::value_parser!(u8).range(1..=3)
        )]
        level: u8,
    },

    /// Print the activation confidence series of one stem
    Activation {
        track_id: String,

        /// Stem index, e.g. 2 or S02
        stem: String,
    },

    /// Check an instrument label against the taxonomy
    Instrument { label: String },

    /// Load every multitrack and print instrument counts
    Stats,
}

#[derive(Serialize)]
struct TrackSummary<'a> {
    stem_idx: u32,
    raw_idx: Option<u32>,
    instrument: &'a str,
    f0_type: String,
    component: Option<&'a str>,
    ranking: Option<u32>,
    mixing_coefficient: Option<f64>,
    duration: Option<f64>,
    file_path: Option<String>,
}

impl<'a> From<&'a Track> for TrackSummary<'a> {
    fn from(t: &'a Track) -> Self {
        TrackSummary {
            stem_idx: t.stem_idx,
            raw_idx: t.raw_idx,
            instrument: &t.instrument,
            f0_type: t.f0_type.to_string(),
            component: t.component.as_deref(),
            ranking: t.ranking,
            mixing_coefficient: t.mixing_coefficient,
            duration: t.duration,
            file_path: t.file_path.as_ref().map(|p| p.display().to_string()),
        }
    }
}

#[derive(Serialize)]
struct MultiTrackSummary<'a> {
    track_id: &'a str,
    artist: &'a str,
    title: &'a str,
    genre: &'a str,
    origin: &'a str,
    metadata_version: &'a str,
    duration: Option<f64>,
    is_excerpt: bool,
    has_bleed: bool,
    is_instrumental: bool,
    has_melody: bool,
    predominant_stem: Option<u32>,
    stems: Vec<TrackSummary<'a>>,
    raw_audio: Vec<TrackSummary<'a>>,
}

impl<'a> From<&'a MultiTrack> for MultiTrackSummary<'a> {
    fn from(m: &'a MultiTrack) -> Self {
        MultiTrackSummary {
            track_id: &m.track_id,
            artist: &m.artist,
            title: &m.title,
            genre: &m.genre,
            origin: &m.origin,
            metadata_version: &m.metadata_version,
            duration: m.duration,
            is_excerpt: m.is_excerpt,
            has_bleed: m.has_bleed,
            is_instrumental: m.is_instrumental,
            has_melody: m.has_melody,
            predominant_stem: m.predominant_stem().map(|t| t.stem_idx),
            stems: m.stems.values().map(TrackSummary::from).collect(),
            raw_audio: m.raw_audio.iter().map(TrackSummary::from).collect(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // CLI > env/config file > defaults
    let mut config = DatasetConfig::load();
    if let Some(dir) = cli.metadata_dir {
        config.metadata_dir = dir;
    }
    if let Some(dir) = cli.annotation_dir {
        config.annotation_dir = dir;
    }
    if cli.audio_dir.is_some() {
        config.audio_dir = cli.audio_dir;
    }
    log::info!("Metadata: {}", config.metadata_dir.display());

    match cli.command {
        Commands::List => {
            let dataset = open_dataset(config)?;
            for id in dataset.track_ids() {
                println!("{id}");
            }
        }

        Commands::Info { track_id, json } => {
            let dataset = open_dataset(config)?;
            let mtrack = load(&dataset, &track_id)?;
            if json {
                let summary = MultiTrackSummary::from(&mtrack);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_info(&mtrack);
            }
        }

        Commands::Stems { track_id } => {
            let dataset = open_dataset(config)?;
            let mtrack = load(&dataset, &track_id)?;
            print_track_table(&mtrack);
        }

        Commands::Melody { track_id, level } => {
            let melody_level = MelodyLevel::try_from(level)?;
            let dataset = open_dataset(config)?;
            let mtrack = load(&dataset, &track_id)?;
            let melody = mtrack
                .melody_annotation(melody_level)
                .with_context(|| format!("Failed to read melody {level} for {track_id}"))?;
            match melody {
                None => println!("No melody {level} annotation for {track_id}."),
                Some(rows) => {
                    // A frame is voiced if any melodic line has a positive f0.
                    let voiced = rows
                        .iter()
                        .filter(|row| row.iter().skip(1).any(|&f0| f0 > 0.0))
                        .count();
                    let lines = rows.iter().map(|row| row.len().saturating_sub(1)).max();
                    let end = rows.last().and_then(|row| row.first()).copied();
                    println!("Melody {level} for {track_id}:");
                    println!("  Frames:  {}", rows.len());
                    println!("  Lines:   {}", lines.unwrap_or(0));
                    println!("  Voiced:  {}", voiced);
                    println!("  Ends at: {:.2}s", end.unwrap_or(0.0));
                }
            }
        }

        Commands::Activation { track_id, stem } => {
            let stem_idx = medleydb::format_index(Some(stem.as_str()))
                .context("Invalid stem index")?
                .unwrap_or_default();
            let dataset = open_dataset(config)?;
            let mtrack = load(&dataset, &track_id)?;
            match mtrack.activation_conf_from_stem(stem_idx) {
                None => println!("No activation data for stem {stem_idx} of {track_id}."),
                Some(series) => {
                    for (t, conf) in series {
                        println!("{t:.4},{conf:.4}");
                    }
                }
            }
        }

        Commands::Instrument { label } => {
            let taxonomy = Taxonomy::load(
                config.taxonomy_path.as_deref(),
                config.f0_types_path.as_deref(),
            )
            .context("Failed to load instrument taxonomy")?;
            if taxonomy.is_valid_instrument(&label) {
                println!("{label}: valid ({})", taxonomy.f0_type(&label));
            } else {
                println!("{label}: not in taxonomy (labels are lowercase)");
            }
        }

        Commands::Stats => {
            let dataset = open_dataset(config)?;
            let result = dataset.load_all();
            let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
            for mtrack in &result.loaded {
                for label in mtrack.stem_instruments() {
                    counts.entry(label).or_default().0 += 1;
                }
                for label in mtrack.raw_instruments() {
                    counts.entry(label).or_default().1 += 1;
                }
            }

            println!(
                "Loaded {} multitracks ({} failed)",
                result.loaded.len(),
                result.failed.len()
            );
            let hours: f64 =
                result.loaded.iter().filter_map(|m| m.duration).sum::<f64>() / 3600.0;
            println!("Total mix duration: {:.1} hours", hours);
            println!();
            println!("{:<30} {:>6} {:>6}", "Instrument", "Stems", "Raw");
            println!("{}", "-".repeat(44));
            for (label, (stems, raw)) in &counts {
                println!("{:<30} {:>6} {:>6}", label, stems, raw);
            }
        }
    }

    Ok(())
}

fn open_dataset(config: DatasetConfig) -> Result<Dataset> {
    Dataset::open(config).context("Failed to open dataset")
}

fn load(dataset: &Dataset, track_id: &str) -> Result<MultiTrack> {
    dataset
        .multitrack(track_id)
        .with_context(|| format!("Failed to load {track_id}"))
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn print_info(m: &MultiTrack) {
    println!("{} - {}", m.artist, m.title);
    println!("==================");
    println!("Track id:      {}", m.track_id);
    println!("Genre:         {}", m.genre);
    println!("Origin:        {}", m.origin);
    println!("Version:       {}", m.metadata_version);
    match m.duration {
        Some(d) => println!("Duration:      {:.1}s", d),
        None => println!("Duration:      (audio missing)"),
    }
    println!("Excerpt:       {}", yes_no(m.is_excerpt));
    println!("Bleed:         {}", yes_no(m.has_bleed));
    println!("Instrumental:  {}", yes_no(m.is_instrumental));
    println!("Has melody:    {}", yes_no(m.has_melody));
    println!("Stems:         {}", m.num_stems());
    println!("Raw sources:   {}", m.num_raw());
    if let Some(stem) = m.predominant_stem() {
        println!("Predominant:   S{:02} ({})", stem.stem_idx, stem.instrument);
    }
}

/// Print stems with their raw sources indented underneath.
fn print_track_table(m: &MultiTrack) {
    println!(
        "{:<8} {:<28} {:<4} {:<10} {:>4} {:>6} {:>7}",
        "Index", "Instrument", "F0", "Component", "Rank", "Mix", "Dur"
    );
    println!("{}", "-".repeat(73));

    for stem in m.stems.values() {
        print_track_row(&format!("S{:02}", stem.stem_idx), stem);
        for raw in m.raw_for_stem(stem.stem_idx) {
            let idx = format!("  R{:02}", raw.raw_idx.unwrap_or_default());
            print_track_row(&idx, raw);
        }
    }

    println!();
    println!("F0: m=monophonic  p=polyphonic  u=unpitched  ?=unknown");
}

fn print_track_row(idx: &str, t: &Track) {
    let instrument: String = if t.instrument.len() > 28 {
        format!("{}...", &t.instrument[..25])
    } else {
        t.instrument.clone()
    };
    let opt = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());

    println!(
        "{:<8} {:<28} {:<4} {:<10} {:>4} {:>6} {:>7}",
        idx,
        instrument,
        t.f0_type.code(),
        t.component.as_deref().unwrap_or("-"),
        opt(t.ranking.map(|r| r.to_string())),
        opt(t.mixing_coefficient.map(|c| format!("{c:.3}"))),
        opt(t.duration.map(|d| format!("{d:.1}s"))),
    );
}
