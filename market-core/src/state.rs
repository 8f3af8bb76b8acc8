use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agents::Agent;
use crate::explain::Narration;
use crate::market::Trade;
use crate::types::{AgentKind, Cash, Energy, Mode, Price, RunState, Weight};

// ============================================================================
// Serializable State Snapshot for JS
// ============================================================================

/// Everything the renderer needs after a completed tick. Read-only: the host
/// answers with intents, never with edited snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct StateSnapshot {
    pub tick: u64,
    pub hour_of_day: u64,
    pub sun_intensity: f64,
    pub is_night: bool,
    pub producers: Vec<AgentSnapshot>,
    pub consumers: Vec<AgentSnapshot>,
    pub price_history: Vec<Price>,
    pub last_trade: Option<Trade>,
    pub narration: Narration,
    pub run_state: RunState,
    pub mode: Mode,
    pub speed_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct AgentSnapshot {
    pub id: String,
    pub kind: AgentKind,
    pub energy: Energy,
    pub cash: Cash,
    pub price: Price,
    pub weight: Weight,
    pub learning_rate: f64,
    pub last_input: Option<f64>,
}

impl From<&Agent> for AgentSnapshot {
    fn from(a: &Agent) -> Self {
        Self {
            id: a.id.0.clone(),
            kind: a.kind,
            energy: a.energy,
            cash: a.cash,
            price: a.price,
            weight: a.weight,
            learning_rate: a.learning_rate,
            last_input: a.last_input,
        }
    }
}
