//! Per-section field mappers. Each one folds the fields of a single line into
//! the part of [`BeatMap`] its section owns.

use tracing::debug;

use crate::{
    objects::BreakPeriod,
    timing::POINT_SEPARATOR,
    BeatMap, BeatmapError, Result,
};

const STANDARD_MODE: &str = "0";
const EVENT_BACKGROUND: &str = "0";
const EVENT_BREAK: &str = "2";

/// `[General]`. Fails only on a non-standard `Mode`.
pub fn map_general(fields: &[String], beatmap: &mut BeatMap) -> Result<()> {
    match fields[0].as_str() {
        "Mode" => {
            if fields[1] != STANDARD_MODE {
                return Err(BeatmapError::UnsupportedMode {
                    mode: fields[1].clone(),
                });
            }
        }
        "StackLeniency" => beatmap.stack_leniency = parse_number(&fields[0], &fields[1]),
        "AudioFilename" => beatmap.audio.push_str(&joined_value(fields)),
        "SampleSet" => {
            let set = match fields[1].as_str() {
                "Normal" | "All" => Some(1),
                "Soft" => Some(2),
                "Drum" => Some(3),
                _ => None,
            };
            if let Some(set) = set {
                beatmap.timings.base_set = set;
                beatmap.timings.last_set = set;
            }
        }
        _ => {}
    }
    Ok(())
}

/// `[Metadata]`. Plain string assignment; unknown keys are ignored.
pub fn map_metadata(fields: &[String], beatmap: &mut BeatMap) {
    let target = match fields[0].as_str() {
        "Title" => &mut beatmap.name,
        "TitleUnicode" => &mut beatmap.name_unicode,
        "Artist" => &mut beatmap.artist,
        "ArtistUnicode" => &mut beatmap.artist_unicode,
        "Creator" => &mut beatmap.creator,
        "Version" => &mut beatmap.difficulty_name,
        "Source" => &mut beatmap.source,
        "Tags" => &mut beatmap.tags,
        _ => return,
    };
    *target = joined_value(fields);
}

/// `[Difficulty]`. Malformed numbers become zero.
pub fn map_difficulty(fields: &[String], beatmap: &mut BeatMap) {
    let (key, value) = (fields[0].as_str(), fields[1].as_str());
    match key {
        "SliderMultiplier" => {
            beatmap.slider_multiplier = parse_number(key, value);
            beatmap.timings.slider_mult = beatmap.slider_multiplier;
        }
        "ApproachRate" => beatmap.difficulty.set_ar(parse_number(key, value)),
        "CircleSize" => beatmap.difficulty.set_cs(parse_number(key, value)),
        "SliderTickRate" => beatmap.timings.tick_rate = parse_number(key, value),
        "HPDrainRate" => beatmap.difficulty.set_hp_drain(parse_number(key, value)),
        "OverallDifficulty" => beatmap.difficulty.set_od(parse_number(key, value)),
        _ => {}
    }
}

/// `[Events]`. Only backgrounds and breaks are recognised.
pub fn map_events(fields: &[String], beatmap: &mut BeatMap) {
    match fields[0].as_str() {
        EVENT_BACKGROUND => match fields.get(2) {
            Some(file) => beatmap.background.push_str(&file.replace('"', "")),
            None => debug!(?fields, "background event without file name"),
        },
        EVENT_BREAK => {
            let Some(end) = fields.get(2) else {
                debug!(?fields, "break event without end time");
                return;
            };
            append_joined(&mut beatmap.pauses_text, ',', &format!("{},{end}", fields[1]));
            beatmap.pauses.push(BreakPeriod::from_fields(fields));
        }
        _ => {}
    }
}

/// `[TimingPoints]`. The whole raw line is kept; structure is parsed later by
/// the timing loader.
pub fn map_timing_point(line: &str, beatmap: &mut BeatMap) {
    append_joined(&mut beatmap.timing_points_text, POINT_SEPARATOR, line);
}

fn append_joined(buffer: &mut String, separator: char, entry: &str) {
    if !buffer.is_empty() {
        buffer.push(separator);
    }
    buffer.push_str(entry);
}

/// Value of a `key: value` line, re-joining values that contained `:`.
fn joined_value(fields: &[String]) -> String {
    fields[1..].join(":")
}

fn parse_number(key: &str, value: &str) -> f64 {
    value.parse::<f64>().unwrap_or_else(|err| {
        debug!(key, value, %err, "malformed numeric field, using zero");
        0.0
    })
}
