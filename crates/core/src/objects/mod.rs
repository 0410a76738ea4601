use serde::{Deserialize, Serialize};

use crate::timing::Timings;

const TYPE_CIRCLE: u32 = 1;
const TYPE_SLIDER: u32 = 1 << 1;
const TYPE_NEW_COMBO: u32 = 1 << 2;
const TYPE_SPINNER: u32 = 1 << 3;

/// Point in osu!pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One entry of the ordered object list. Pauses share the list with playable
/// objects but never receive numbering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitObject {
    pub start_time: i64,
    pub end_time: i64,
    pub position: Vec2,
    pub new_combo: bool,
    /// Global index among non-pause objects.
    pub number: Option<usize>,
    pub combo_number: Option<u32>,
    pub combo_set: Option<u32>,
    pub stack_index: u32,
    pub stack_offset: Vec2,
    pub sample_set: u32,
    pub kind: ObjectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Circle,
    Slider(SliderData),
    Spinner,
    Pause,
}

/// Raw slider description plus the timing values attached after the header
/// pass. Curve geometry is left to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderData {
    pub curve_type: CurveType,
    /// Control points including the head position.
    pub control_points: Vec<Vec2>,
    pub repeats: u32,
    pub pixel_length: f64,
    /// Velocity in osu!pixels per second.
    pub velocity: f64,
    /// Duration of one span in milliseconds.
    pub span_duration: f64,
    pub tick_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveType {
    Linear,
    Perfect,
    Bezier,
    Catmull,
}

impl CurveType {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "L" => Self::Linear,
            "P" => Self::Perfect,
            "C" => Self::Catmull,
            _ => Self::Bezier,
        }
    }
}

impl HitObject {
    fn new(start_time: i64, position: Vec2, new_combo: bool, kind: ObjectKind) -> Self {
        Self {
            start_time,
            end_time: start_time,
            position,
            new_combo,
            number: None,
            combo_number: None,
            combo_set: None,
            stack_index: 0,
            stack_offset: Vec2::default(),
            sample_set: 0,
            kind,
        }
    }

    pub fn circle(start_time: i64, position: Vec2, new_combo: bool) -> Self {
        Self::new(start_time, position, new_combo, ObjectKind::Circle)
    }

    pub fn spinner(start_time: i64, end_time: i64, new_combo: bool) -> Self {
        let mut object = Self::new(start_time, Vec2::new(256.0, 192.0), new_combo, ObjectKind::Spinner);
        object.end_time = end_time.max(start_time);
        object
    }

    pub fn pause(start_time: i64, end_time: i64) -> Self {
        let mut object = Self::new(start_time, Vec2::default(), false, ObjectKind::Pause);
        object.end_time = end_time.max(start_time);
        object
    }

    pub fn is_pause(&self) -> bool {
        matches!(self.kind, ObjectKind::Pause)
    }

    pub fn is_spinner(&self) -> bool {
        matches!(self.kind, ObjectKind::Spinner)
    }

    /// Attaches timing-dependent values. Requires the timing points to be
    /// loaded; objects before the first section use the first section.
    pub fn set_timing(&mut self, timings: &Timings) {
        if self.is_pause() {
            return;
        }
        self.sample_set = timings.sample_set_at(self.start_time);

        let ObjectKind::Slider(slider) = &mut self.kind else {
            return;
        };
        let Some(point) = timings.point_at(self.start_time) else {
            return;
        };
        if point.beat_length <= 0.0 || timings.slider_mult <= 0.0 {
            return;
        }

        let pixels_per_beat = 100.0 * timings.slider_mult;
        slider.velocity = pixels_per_beat * 1000.0 / point.beat_length;
        slider.span_duration = slider.pixel_length / pixels_per_beat * point.beat_length;
        if timings.tick_rate > 0.0 {
            slider.tick_distance = pixels_per_beat / timings.tick_rate;
        }
        let duration = (slider.span_duration * f64::from(slider.repeats)).round();
        self.end_time = self.start_time.saturating_add(duration as i64);
    }
}

/// A break between gameplay sections, declared in `[Events]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start_time: i64,
    pub end_time: i64,
}

impl BreakPeriod {
    /// Builds a break from raw event fields `2,start,end`. Missing or
    /// malformed bounds become zero.
    pub fn from_fields(fields: &[String]) -> Self {
        let bound = |index: usize| {
            fields
                .get(index)
                .and_then(|value| parse_time(value))
                .unwrap_or(0)
        };
        Self {
            start_time: bound(1),
            end_time: bound(2),
        }
    }
}

impl From<&BreakPeriod> for HitObject {
    fn from(period: &BreakPeriod) -> Self {
        HitObject::pause(period.start_time, period.end_time)
    }
}

/// Turns one tokenized `[HitObjects]` line into a record, or `None` when the
/// line cannot be interpreted.
pub trait ObjectFactory {
    fn build(&self, fields: &[String]) -> Option<HitObject>;
}

/// Factory for the osu!standard object encoding
/// `x,y,time,type,hitSound,extras...`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardObjectFactory;

impl ObjectFactory for StandardObjectFactory {
    fn build(&self, fields: &[String]) -> Option<HitObject> {
        if fields.len() < 4 {
            return None;
        }

        let x = fields[0].parse::<f64>().ok()?;
        let y = fields[1].parse::<f64>().ok()?;
        let time = parse_time(&fields[2])?;
        let kind = fields[3].parse::<u32>().ok()?;
        let position = Vec2::new(x, y);
        let new_combo = kind & TYPE_NEW_COMBO != 0;

        if kind & TYPE_CIRCLE != 0 {
            Some(HitObject::circle(time, position, new_combo))
        } else if kind & TYPE_SLIDER != 0 {
            let slider = parse_slider(position, fields.get(5..8)?)?;
            Some(HitObject::new(time, position, new_combo, ObjectKind::Slider(slider)))
        } else if kind & TYPE_SPINNER != 0 {
            let end_time = parse_time(fields.get(5)?)?;
            Some(HitObject::spinner(time, end_time, new_combo))
        } else {
            None
        }
    }
}

fn parse_slider(head: Vec2, fields: &[String]) -> Option<SliderData> {
    let mut curve = fields[0].split('|');
    let curve_type = CurveType::from_tag(curve.next()?);

    let mut control_points = vec![head];
    for point in curve {
        let (x, y) = point.split_once(':')?;
        control_points.push(Vec2::new(x.trim().parse().ok()?, y.trim().parse().ok()?));
    }

    Some(SliderData {
        curve_type,
        control_points,
        repeats: fields[1].parse::<u32>().ok()?.max(1),
        pixel_length: fields[2].parse::<f64>().ok().filter(|length| length.is_finite())?,
        velocity: 0.0,
        span_duration: 0.0,
        tick_distance: 0.0,
    })
}

/// Times are milliseconds and must fit the 32-bit range the format uses.
fn parse_time(value: &str) -> Option<i64> {
    let time = value.trim().parse::<f64>().ok()?;
    let range = f64::from(i32::MIN)..=f64::from(i32::MAX);
    range.contains(&time).then(|| time as i64)
}
