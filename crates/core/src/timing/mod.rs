use serde::{Deserialize, Serialize};
use tracing::warn;

/// Separator between entries of the raw timing-point string.
pub const POINT_SEPARATOR: char = '|';

const DEFAULT_METER: u32 = 4;
const DEFAULT_VOLUME: u32 = 100;
const KIAI_FLAG: u32 = 1;

/// A single timing section, with the beat length already resolved for
/// inherited points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    pub time: i64,
    /// Beat length in effect for this section, in milliseconds.
    pub beat_length: f64,
    /// Beat length of the governing uninherited point.
    pub base_beat_length: f64,
    pub meter: u32,
    /// 0 means "use the beatmap default".
    pub sample_set: u32,
    pub sample_index: u32,
    pub volume: u32,
    pub uninherited: bool,
    pub kiai: bool,
}

impl TimingPoint {
    /// Slider velocity multiplier relative to the uninherited point.
    pub fn velocity_multiplier(&self) -> f64 {
        if self.beat_length > 0.0 {
            self.base_beat_length / self.beat_length
        } else {
            1.0
        }
    }
}

/// Queryable timing data of a beatmap. Header fields fill the scalar settings,
/// the [`TimingLoader`] fills the points once the header pass is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timings {
    pub slider_mult: f64,
    pub tick_rate: f64,
    pub base_set: u32,
    pub last_set: u32,
    points: Vec<TimingPoint>,
    loaded: bool,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            slider_mult: 1.4,
            tick_rate: 1.0,
            base_set: 1,
            last_set: 1,
            points: Vec::new(),
            loaded: false,
        }
    }
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[TimingPoint] {
        &self.points
    }

    /// Whether a loader has materialised the points.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Replaces the points, keeping them ordered by time.
    pub fn set_points(&mut self, mut points: Vec<TimingPoint>) {
        points.sort_by_key(|point| point.time);
        self.points = points;
        self.loaded = true;
    }

    /// Returns the point governing `time`: the last one starting at or before
    /// it, or the first point for times before the first section.
    pub fn point_at(&self, time: i64) -> Option<&TimingPoint> {
        let index = self.points.partition_point(|point| point.time <= time);
        self.points.get(index.saturating_sub(1))
    }

    /// Sample set in effect at `time`, resolving "beatmap default" to the base
    /// set declared in `[General]`.
    pub fn sample_set_at(&self, time: i64) -> u32 {
        match self.point_at(time) {
            Some(point) if point.sample_set != 0 => point.sample_set,
            _ => self.base_set,
        }
    }
}

/// Builds the timing structure from the raw pipe-joined timing-point string.
///
/// Implementations fill the points through [`Timings::set_points`]. The
/// parser calls the loader once per header pass and marks the timings as
/// loaded afterwards, so a loader that keeps no points still lets the object
/// pass run.
pub trait TimingLoader {
    fn load(&self, raw: &str, timings: &mut Timings);
}

/// Loader for the osu! timing-point format
/// `time,beatLength,meter,sampleSet,sampleIndex,volume,uninherited,effects`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardTimingLoader;

impl TimingLoader for StandardTimingLoader {
    fn load(&self, raw: &str, timings: &mut Timings) {
        let mut points = Vec::new();
        let mut base_beat_length = None;

        for entry in raw.split(POINT_SEPARATOR).filter(|e| !e.trim().is_empty()) {
            let Some(point) = parse_point(entry, &mut base_beat_length) else {
                warn!(entry, "skipping malformed timing point");
                continue;
            };
            points.push(point);
        }

        timings.set_points(points);
    }
}

fn parse_point(entry: &str, base_beat_length: &mut Option<f64>) -> Option<TimingPoint> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    if fields.len() < 2 {
        return None;
    }

    let time = fields[0].parse::<f64>().ok()? as i64;
    let raw_length = fields[1].parse::<f64>().ok()?;
    let field = |index: usize, default: u32| {
        fields
            .get(index)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(default)
    };

    let flagged = fields.get(6).map_or(true, |value| *value != "0");
    let uninherited = flagged && raw_length > 0.0;

    let (beat_length, base) = if uninherited {
        *base_beat_length = Some(raw_length);
        (raw_length, raw_length)
    } else {
        let base = (*base_beat_length)?;
        let scale = (-raw_length).clamp(10.0, 1000.0) / 100.0;
        (base * scale, base)
    };

    Some(TimingPoint {
        time,
        beat_length,
        base_beat_length: base,
        meter: field(2, DEFAULT_METER),
        sample_set: field(3, 0),
        sample_index: field(4, 0),
        volume: field(5, DEFAULT_VOLUME),
        uninherited,
        kiai: field(7, 0) & KIAI_FLAG != 0,
    })
}
