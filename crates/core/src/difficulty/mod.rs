use serde::{Deserialize, Serialize};

const DEFAULT_VALUE: f64 = 5.0;

/// Difficulty parameters of a beatmap together with the values derived from
/// them. Each parameter has its own setter so derived values stay in sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difficulty {
    approach_rate: f64,
    circle_size: f64,
    hp_drain: f64,
    overall_difficulty: f64,
    /// Time in milliseconds an object is visible before its start time.
    preempt: f64,
    /// Circle radius in osu!pixels.
    circle_radius: f64,
    hit_windows: HitWindows,
}

/// Hit windows in milliseconds for the three hit results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HitWindows {
    pub great: f64,
    pub ok: f64,
    pub meh: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        let mut difficulty = Self {
            approach_rate: DEFAULT_VALUE,
            circle_size: DEFAULT_VALUE,
            hp_drain: DEFAULT_VALUE,
            overall_difficulty: DEFAULT_VALUE,
            preempt: 0.0,
            circle_radius: 0.0,
            hit_windows: HitWindows::default(),
        };
        difficulty.set_ar(DEFAULT_VALUE);
        difficulty.set_cs(DEFAULT_VALUE);
        difficulty.set_od(DEFAULT_VALUE);
        difficulty
    }
}

impl Difficulty {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ar(&mut self, approach_rate: f64) {
        self.approach_rate = approach_rate;
        self.preempt = if approach_rate < 5.0 {
            1800.0 - 120.0 * approach_rate
        } else {
            1950.0 - 150.0 * approach_rate
        };
    }

    pub fn set_cs(&mut self, circle_size: f64) {
        self.circle_size = circle_size;
        self.circle_radius = 54.4 - 4.48 * circle_size;
    }

    pub fn set_hp_drain(&mut self, hp_drain: f64) {
        self.hp_drain = hp_drain;
    }

    pub fn set_od(&mut self, overall_difficulty: f64) {
        self.overall_difficulty = overall_difficulty;
        self.hit_windows = HitWindows {
            great: 80.0 - 6.0 * overall_difficulty,
            ok: 140.0 - 8.0 * overall_difficulty,
            meh: 200.0 - 10.0 * overall_difficulty,
        };
    }

    pub fn approach_rate(&self) -> f64 {
        self.approach_rate
    }

    pub fn circle_size(&self) -> f64 {
        self.circle_size
    }

    pub fn hp_drain(&self) -> f64 {
        self.hp_drain
    }

    pub fn overall_difficulty(&self) -> f64 {
        self.overall_difficulty
    }

    pub fn preempt(&self) -> f64 {
        self.preempt
    }

    pub fn circle_radius(&self) -> f64 {
        self.circle_radius
    }

    pub fn hit_windows(&self) -> HitWindows {
        self.hit_windows
    }
}
