use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{BeatmapError, Result};

/// Top-level configuration for the parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Root folder beatmap directories live under.
    pub songs_dir: Option<PathBuf>,
    pub combo_numbering: ComboNumbering,
    /// Run the stacking resolver at the end of the object pass.
    pub stacking: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            songs_dir: None,
            combo_numbering: ComboNumbering::default(),
            stacking: true,
        }
    }
}

impl ParserConfig {
    /// Loads a configuration from a JSON file. Missing keys fall back to their
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            BeatmapError::Config(format!("cannot read `{}`: {err}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| BeatmapError::Config(err.to_string()))
    }

    /// Resolves a beatmap location relative to the songs directory. Absolute
    /// paths and a missing songs directory leave the path untouched.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.songs_dir {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// How combo sets are counted when the object list is numbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComboNumbering {
    /// The first numbered object always opens a combo set, flagged or not.
    #[default]
    ImplicitFirstReset,
    /// Only objects carrying the new-combo flag open a combo set.
    Literal,
}
