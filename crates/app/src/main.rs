use std::path::PathBuf;

use beatmap_core::{BeatMap, BeatmapParser, ObjectKind, ParserConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> beatmap_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let parser = BeatmapParser::new(load_config(&cli)?);

    match cli.command {
        Commands::Info { path, json } => run_info(&parser, &path, json),
        Commands::Objects { path, json } => run_objects(&parser, &path, json),
    }
}

fn load_config(cli: &Cli) -> beatmap_core::Result<ParserConfig> {
    let mut config = match &cli.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    };
    if let Some(songs_dir) = &cli.songs_dir {
        config.songs_dir = Some(songs_dir.clone());
    }
    Ok(config)
}

fn run_info(parser: &BeatmapParser, path: &PathBuf, json: bool) -> beatmap_core::Result<()> {
    tracing::info!(?path, "reading beatmap header");
    let beatmap = parser.open(path)?;

    if json {
        return print_json(&beatmap);
    }

    println!("{} - {} [{}]", beatmap.artist, beatmap.name, beatmap.difficulty_name);
    println!("mapped by {}", beatmap.creator);
    println!("audio: {}", beatmap.audio);
    println!("background: {}", beatmap.background);
    let difficulty = &beatmap.difficulty;
    println!(
        "AR {} CS {} HP {} OD {}",
        difficulty.approach_rate(),
        difficulty.circle_size(),
        difficulty.hp_drain(),
        difficulty.overall_difficulty()
    );
    println!(
        "{} timing points, {} breaks",
        beatmap.timings.points().len(),
        beatmap.pauses.len()
    );
    Ok(())
}

fn run_objects(parser: &BeatmapParser, path: &PathBuf, json: bool) -> beatmap_core::Result<()> {
    tracing::info!(?path, "reading beatmap objects");
    let beatmap = parser.load(path)?;

    if json {
        return print_json(&beatmap);
    }

    let (mut circles, mut sliders, mut spinners, mut pauses) = (0, 0, 0, 0);
    for object in &beatmap.hit_objects {
        match object.kind {
            ObjectKind::Circle => circles += 1,
            ObjectKind::Slider(_) => sliders += 1,
            ObjectKind::Spinner => spinners += 1,
            ObjectKind::Pause => pauses += 1,
        }
    }
    let combo_sets = beatmap
        .playable_objects()
        .filter_map(|object| object.combo_set)
        .max()
        .unwrap_or(0);
    let last_end = beatmap
        .playable_objects()
        .map(|object| object.end_time)
        .max()
        .unwrap_or(0);

    println!("{} - {} [{}]", beatmap.artist, beatmap.name, beatmap.difficulty_name);
    println!("{circles} circles, {sliders} sliders, {spinners} spinners, {pauses} breaks");
    println!("{combo_sets} combos, ends at {last_end} ms");
    Ok(())
}

fn print_json(beatmap: &BeatMap) -> beatmap_core::Result<()> {
    let text = serde_json::to_string_pretty(beatmap)
        .map_err(|err| beatmap_core::BeatmapError::msg(err.to_string()))?;
    println!("{text}");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect osu! beatmap files", long_about = None)]
struct Cli {
    /// JSON parser configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Songs folder relative beatmap paths are resolved against.
    #[arg(long, global = true)]
    songs_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read metadata, difficulty and timing only.
    Info {
        /// Path to the `.osu` file.
        path: PathBuf,
        /// Print the parsed model as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Read the full beatmap including hit objects.
    Objects {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
}
