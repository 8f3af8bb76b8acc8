//! Error correction after a tick that cleared nothing.
//!
//! Only one producer is nudged per failed tick and only downward. A
//! successful trade leaves every weight untouched.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agents::Agent;
use crate::config::{FailureSelection, LearningConfig};
use crate::types::{AgentId, Price, Weight};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct LearningUpdate {
    #[tsify(type = "string")]
    pub agent_id: AgentId,
    /// Ask the producer failed to sell at.
    pub price: Price,
    pub old_weight: Weight,
    pub new_weight: Weight,
}

/// Index of the producer blamed for the failed tick.
pub fn select_failing(producers: &[Agent], selection: FailureSelection) -> Option<usize> {
    match selection {
        FailureSelection::FirstProducer => (!producers.is_empty()).then_some(0),
        // max_by_key keeps the last max; reverse so ties go to the earliest
        FailureSelection::HighestAsk => producers
            .iter()
            .enumerate()
            .rev()
            .max_by_key(|(_, p)| p.price)
            .map(|(i, _)| i),
    }
}

/// `w = max(floor, w + gradient * learning_rate)`
pub fn corrected_weight(weight: Weight, learning_rate: f64, config: &LearningConfig) -> Weight {
    (weight + config.error_gradient * learning_rate).max(config.weight_floor)
}

/// Apply the negative gradient step to the failing producer.
///
/// Returns `None` only for an empty population, which world construction
/// rules out.
pub fn apply_error_correction(
    producers: &mut [Agent],
    config: &LearningConfig,
) -> Option<LearningUpdate> {
    let idx = select_failing(producers, config.selection)?;
    let producer = &mut producers[idx];
    let old_weight = producer.weight;
    producer.weight = corrected_weight(old_weight, producer.learning_rate, config);

    Some(LearningUpdate {
        agent_id: producer.id.clone(),
        price: producer.price,
        old_weight,
        new_weight: producer.weight,
    })
}
