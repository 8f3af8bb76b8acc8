use std::fmt;

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

// === CORE TYPES ===

pub type Price = u32;
pub type Energy = u32;
pub type Cash = u32;
pub type Weight = f64;

// === AGENT IDENTITY ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum AgentKind {
    Producer,
    Consumer,
}

impl AgentKind {
    /// Prefix used for generated ids (`P0`, `C3`, ...)
    pub fn id_prefix(self) -> char {
        match self {
            AgentKind::Producer => 'P',
            AgentKind::Consumer => 'C',
        }
    }
}

/// Stable agent identifier, unique within its population.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(kind: AgentKind, index: usize) -> Self {
        Self(format!("{}{}", kind.id_prefix(), index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// === PRESENTATION-FACING ENUMS ===

/// Narration mode chosen by the viewer. Mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    None,
    Classroom,
    Pro,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    PausedForExplanation,
}

/// Which side the trade animation travels from. No effect on state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Left,
    Right,
}
