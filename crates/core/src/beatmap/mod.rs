use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    difficulty::Difficulty,
    objects::{BreakPeriod, HitObject},
    timing::Timings,
};

const DEFAULT_STACK_LENIENCY: f64 = 0.7;
const DEFAULT_SLIDER_MULTIPLIER: f64 = 1.4;

/// In-memory model of a single beatmap file.
///
/// The header pass fills the metadata, difficulty, events and raw timing
/// text; the object pass fills and post-processes `hit_objects`. A model is
/// exclusively owned by its caller while either pass runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatMap {
    /// Name of the folder the file lives in.
    pub dir: String,
    pub file: String,
    pub path: PathBuf,

    pub name: String,
    pub name_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    /// Difficulty label (`Version`).
    pub difficulty_name: String,
    pub source: String,
    pub tags: String,

    pub audio: String,
    pub background: String,

    pub slider_multiplier: f64,
    pub stack_leniency: f64,
    pub difficulty: Difficulty,
    pub timings: Timings,

    /// Timing-point lines joined with `|`.
    pub timing_points_text: String,
    /// Break bounds as `start,end` pairs joined with `,`.
    pub pauses_text: String,
    pub pauses: Vec<BreakPeriod>,
    pub hit_objects: Vec<HitObject>,
}

impl Default for BeatMap {
    fn default() -> Self {
        let mut timings = Timings::new();
        timings.slider_mult = DEFAULT_SLIDER_MULTIPLIER;
        Self {
            dir: String::new(),
            file: String::new(),
            path: PathBuf::new(),
            name: String::new(),
            name_unicode: String::new(),
            artist: String::new(),
            artist_unicode: String::new(),
            creator: String::new(),
            difficulty_name: String::new(),
            source: String::new(),
            tags: String::new(),
            audio: String::new(),
            background: String::new(),
            slider_multiplier: DEFAULT_SLIDER_MULTIPLIER,
            stack_leniency: DEFAULT_STACK_LENIENCY,
            difficulty: Difficulty::default(),
            timings,
            timing_points_text: String::new(),
            pauses_text: String::new(),
            pauses: Vec::new(),
            hit_objects: Vec::new(),
        }
    }
}

impl BeatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty model for the file at `path`, recording its folder and
    /// file name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name_of = |p: Option<&Path>| {
            p.and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        Self {
            dir: name_of(path.parent()),
            file: name_of(Some(path)),
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Creates an empty model for `<songs_dir>/<dir>/<file>`.
    pub fn locate(songs_dir: impl AsRef<Path>, dir: &str, file: &str) -> Self {
        Self {
            dir: dir.to_string(),
            file: file.to_string(),
            path: songs_dir.as_ref().join(dir).join(file),
            ..Self::default()
        }
    }

    /// Whether title, artist and creator are all empty.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() && self.artist.is_empty() && self.creator.is_empty()
    }

    /// Playable objects, skipping pauses.
    pub fn playable_objects(&self) -> impl Iterator<Item = &HitObject> {
        self.hit_objects.iter().filter(|object| !object.is_pause())
    }
}
