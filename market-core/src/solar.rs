//! Day/night cycle.
//!
//! One tick is one simulated hour. Everything here is a pure function of the
//! tick counter; nothing about the sun is stored.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

pub const HOURS_PER_DAY: u64 = 24;

/// Sun is up strictly between these hours.
const DAWN_HOUR: u64 = 5;
const DUSK_HOUR: u64 = 19;
const NOON_HOUR: f64 = 12.0;
/// Hours from noon to the zero crossing of the triangle.
const HALF_DAYLIGHT: f64 = 7.0;

pub fn hour_of_day(tick: u64) -> u64 {
    tick % HOURS_PER_DAY
}

/// Sun intensity in `[0, 1]`: a triangle peaking at noon, zero outside (5, 19).
pub fn sun_intensity(tick: u64) -> f64 {
    let hour = hour_of_day(tick);
    if hour > DAWN_HOUR && hour < DUSK_HOUR {
        (1.0 - (NOON_HOUR - hour as f64).abs() / HALF_DAYLIGHT).max(0.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum SunTransition {
    Sunrise,
    Sunset,
}

/// Detect whether `tick` is the first lit hour or the first dark hour.
pub fn sun_transition(tick: u64) -> Option<SunTransition> {
    let prev = sun_intensity(tick.checked_sub(1)?);
    let now = sun_intensity(tick);
    match (prev > 0.0, now > 0.0) {
        (false, true) => Some(SunTransition::Sunrise),
        (true, false) => Some(SunTransition::Sunset),
        _ => None,
    }
}
