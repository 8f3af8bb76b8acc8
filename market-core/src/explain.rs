//! Narration records and the auto-pause decision.
//!
//! Both are pure functions of the active [`Mode`] and the tick's outcome, so
//! the renderer never has to know why the loop stopped.

use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::solar::SunTransition;
use crate::tick::TickOutcome;
use crate::types::{AgentId, Mode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Narration {
    pub title: String,
    pub body: String,
    #[tsify(type = "string | null")]
    pub highlight_id: Option<AgentId>,
    pub paused_for_explanation: bool,
}

impl Narration {
    pub fn ready() -> Self {
        Self {
            title: "SYSTEM READY".to_string(),
            body: "Press START to boot the environment.".to_string(),
            highlight_id: None,
            paused_for_explanation: false,
        }
    }

    /// Shown when the viewer dismisses an explanation.
    pub fn resumed(self) -> Self {
        Self {
            body: "Computing next epoch...".to_string(),
            paused_for_explanation: false,
            ..self
        }
    }
}

/// Pro mode stops on every sale and every weight update. Other modes never stop.
pub fn should_pause(mode: Mode, outcome: &TickOutcome) -> bool {
    mode == Mode::Pro && outcome.is_narratable()
}

fn day_night_remark(is_night: bool) -> &'static str {
    if is_night {
        "It's night, so the price is high."
    } else {
        "The sun is out, prices are stable."
    }
}

/// Build the narration record for a completed tick.
pub fn narrate(mode: Mode, outcome: &TickOutcome, seller_energy: Option<u32>, is_night: bool) -> Narration {
    let pause = should_pause(mode, outcome);
    let highlight_id = outcome
        .trade
        .as_ref()
        .map(|t| t.seller_id.clone())
        .or_else(|| outcome.learning.as_ref().map(|u| u.agent_id.clone()));

    let (pro_title, text) = match (&outcome.trade, &outcome.learning, mode) {
        (Some(trade), _, Mode::Pro) => (
            "REWARD FUNCTION (+1)",
            format!(
                "> INPUT: Energy={}, Sun={:.1}\n> DECISION: Sell at ${}\n> REWARD: Positive. Weights stay where they are.",
                seller_energy.unwrap_or_default(),
                outcome.sun,
                trade.ask,
            ),
        ),
        (Some(trade), _, Mode::Classroom) => (
            "",
            format!(
                "Deal! {} sold to {}. {}",
                trade.seller_id,
                trade.buyer_id,
                day_night_remark(is_night)
            ),
        ),
        (None, Some(update), Mode::Pro) => (
            "BACKPROPAGATION (Error Correction)",
            format!(
                "> FAILURE: {} did not sell (price ${}).\n> CAUSE: Price too high for current demand.\n> ACTION: Adjusting 'greed' weight downward.\n> NEW WEIGHT: {:.2}",
                update.agent_id, update.price, update.new_weight,
            ),
        ),
        (None, Some(update), Mode::Classroom) => (
            "",
            format!(
                "Nobody is buying. {} will lower its expectations next time.",
                update.agent_id
            ),
        ),
        _ => ("", String::new()),
    };

    if pause {
        return Narration {
            title: pro_title.to_string(),
            body: text,
            highlight_id,
            paused_for_explanation: true,
        };
    }

    let title = match mode {
        Mode::Classroom => "Economics Class",
        Mode::None | Mode::Pro => "Network Monitor",
    };
    let body = if text.is_empty() {
        format!("Hour: {}:00. Sun: {:.0}%.", outcome.hour, outcome.sun * 100.0)
    } else {
        text
    };
    Narration {
        title: title.to_string(),
        body,
        highlight_id,
        paused_for_explanation: false,
    }
}

/// Short spoken line for the narrator channel, if this tick has one.
pub fn speech_lines(outcome: &TickOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome.transition {
        Some(SunTransition::Sunrise) => {
            lines.push("The sun rises. Producers start generating energy.".to_string())
        }
        Some(SunTransition::Sunset) => {
            lines.push("Night falls. Producers raise their prices out of scarcity.".to_string())
        }
        None => {}
    }
    if let Some(trade) = &outcome.trade {
        lines.push(format!(
            "{} sold energy to {} for {}.",
            trade.seller_id, trade.buyer_id, trade.price
        ));
    }
    if let Some(update) = &outcome.learning {
        lines.push(format!(
            "Nobody bought. {} lowers its greed to {:.2}.",
            update.agent_id, update.new_weight
        ));
    }
    lines
}
