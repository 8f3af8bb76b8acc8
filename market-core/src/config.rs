//! Typed configuration for the market engine.
//!
//! Every field has a default matching the classroom demo, so an empty JSON
//! object (`{}`) yields the standard 4 producer / 4 consumer world.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::error::ConfigError;
use crate::types::{Cash, Energy, Price, Weight};

// === TOP LEVEL ===

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct MarketConfig {
    pub population: PopulationConfig,
    pub pricing: PricingConfig,
    pub learning: LearningConfig,
    pub history: HistoryConfig,
    pub schedule: ScheduleConfig,
    pub narrator: NarratorConfig,
}

impl MarketConfig {
    /// Parse a JSON config; missing sections fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would break engine invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pop = &self.population;
        if pop.producers == 0 {
            return Err(ConfigError::EmptyPopulation { kind: "producer" });
        }
        if pop.consumers == 0 {
            return Err(ConfigError::EmptyPopulation { kind: "consumer" });
        }
        if !(pop.learning_rate > 0.0 && pop.learning_rate.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "population.learning_rate",
                reason: format!("must be positive, got {}", pop.learning_rate),
            });
        }
        if !(self.learning.weight_floor..=1.0).contains(&pop.initial_weight) {
            return Err(ConfigError::OutOfRange {
                field: "population.initial_weight",
                reason: format!(
                    "must lie in [{}, 1.0], got {}",
                    self.learning.weight_floor, pop.initial_weight
                ),
            });
        }
        if !(0.0..1.0).contains(&self.learning.weight_floor) {
            return Err(ConfigError::OutOfRange {
                field: "learning.weight_floor",
                reason: format!("must lie in [0, 1), got {}", self.learning.weight_floor),
            });
        }
        if self.pricing.fuzzy_span <= 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "pricing.fuzzy_span",
                reason: "must be positive".to_string(),
            });
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "history.capacity",
                reason: "must hold at least one price".to_string(),
            });
        }
        let schedule = &self.schedule;
        if schedule.min_interval_ms == 0 || schedule.min_interval_ms > schedule.max_interval_ms {
            return Err(ConfigError::OutOfRange {
                field: "schedule.min_interval_ms",
                reason: format!(
                    "need 0 < min <= max, got {}..={}",
                    schedule.min_interval_ms, schedule.max_interval_ms
                ),
            });
        }
        Ok(())
    }
}

// === POPULATION ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct PopulationConfig {
    pub producers: usize,
    pub consumers: usize,
    pub producer_energy: Energy,
    pub consumer_energy: Energy,
    pub producer_cash: Cash,
    /// Budget each consumer starts with; consumers only ever spend it.
    pub consumer_cash: Cash,
    /// Quote shown before the first tick reprices everyone.
    pub producer_price: Price,
    pub consumer_price: Price,
    pub initial_weight: Weight,
    pub learning_rate: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            producers: 4,
            consumers: 4,
            producer_energy: 5,
            consumer_energy: 5,
            producer_cash: 0,
            consumer_cash: 100,
            producer_price: 15,
            consumer_price: 5,
            initial_weight: 0.5,
            learning_rate: 0.05,
        }
    }
}

// === PRICING ===

/// Constants of the single-neuron pricing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct PricingConfig {
    /// Producer ask with zero fuzzy input (and before night bias).
    pub producer_ceiling: f64,
    pub producer_floor: Price,
    pub night_bias: f64,
    /// Sun intensity strictly below this counts as night.
    pub night_threshold: f64,
    pub consumer_base: f64,
    pub consumer_span: f64,
    /// Energy at which a producer starts feeling "full".
    pub producer_fuzzy_offset: f64,
    /// Energy at which a consumer stops feeling "needy".
    pub consumer_fuzzy_ceiling: f64,
    pub fuzzy_span: f64,
    /// Energy a producer gains on a successful solar roll.
    pub generation: Energy,
    /// Energy a consumer burns every tick.
    pub consumption: Energy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            producer_ceiling: 15.0,
            producer_floor: 2,
            night_bias: 5.0,
            night_threshold: 0.2,
            consumer_base: 5.0,
            consumer_span: 15.0,
            producer_fuzzy_offset: 2.0,
            consumer_fuzzy_ceiling: 10.0,
            fuzzy_span: 10.0,
            generation: 2,
            consumption: 1,
        }
    }
}

// === LEARNING ===

/// Which producer is blamed when a tick clears no trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum FailureSelection {
    /// First producer in creation order.
    #[default]
    FirstProducer,
    /// Producer with the highest ask; ties go to the earliest.
    HighestAsk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct LearningConfig {
    pub error_gradient: f64,
    pub weight_floor: Weight,
    pub selection: FailureSelection,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            error_gradient: -0.1,
            weight_floor: 0.1,
            selection: FailureSelection::FirstProducer,
        }
    }
}

// === HISTORY ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
    /// Values the chart starts from before any trade clears.
    pub seed: Vec<Price>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 25,
            seed: vec![10, 10, 10],
        }
    }
}

// === SCHEDULE ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct ScheduleConfig {
    pub min_interval_ms: u32,
    pub max_interval_ms: u32,
    pub default_interval_ms: u32,
    /// Fixed pace of the classroom mode; ignores the speed setting.
    pub classroom_interval_ms: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 200,
            max_interval_ms: 3000,
            default_interval_ms: 2000,
            classroom_interval_ms: 3500,
        }
    }
}

impl ScheduleConfig {
    pub fn clamp_interval(&self, interval_ms: u32) -> u32 {
        interval_ms.clamp(self.min_interval_ms, self.max_interval_ms)
    }
}

// === NARRATOR ===

/// Voice settings forwarded untouched to the host's speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(default)]
pub struct NarratorConfig {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
    pub queue_capacity: usize,
}

impl Default for NarratorConfig {
    fn default() -> Self {
        Self {
            rate: 1.1,
            pitch: 1.0,
            volume: 1.0,
            lang: "es".to_string(),
            queue_capacity: 16,
        }
    }
}
