//! Core library for parsing osu! beatmap description files.
//!
//! Parsing happens in two passes over the same source. The header pass reads
//! metadata, difficulty settings, events and timing points and is enough for
//! browsing. The object pass reads `[HitObjects]`, then sorts, numbers, times
//! and stacks the objects. It needs the timing data from the first pass, so a
//! model only goes through it after a successful header pass.
//!
//! ```no_run
//! use beatmap_core::{BeatmapParser, ParserConfig};
//!
//! let parser = BeatmapParser::new(ParserConfig::default());
//! let beatmap = parser.load("map.osu")?;
//! println!("{} objects", beatmap.hit_objects.len());
//! # Ok::<(), beatmap_core::BeatmapError>(())
//! ```

pub mod beatmap;
pub mod config;
pub mod difficulty;
pub mod error;
pub mod lexer;
pub mod mapping;
pub mod objects;
pub mod parser;
pub mod stacking;
pub mod timing;

pub use beatmap::BeatMap;
pub use config::{ComboNumbering, ParserConfig};
pub use difficulty::{Difficulty, HitWindows};
pub use error::{BeatmapError, Result};
pub use lexer::{section_name, tokenize, Section, SectionTracker};
pub use objects::{
    BreakPeriod, CurveType, HitObject, ObjectFactory, ObjectKind, SliderData,
    StandardObjectFactory, Vec2,
};
pub use parser::BeatmapParser;
pub use stacking::{StackResolver, StandardStackResolver};
pub use timing::{StandardTimingLoader, TimingLoader, TimingPoint, Timings};
