//! Per-agent pricing: fuzzify energy, run it through a one-weight linear
//! neuron, and floor the activation into an integer quote.

use rand::Rng;

use crate::agents::Agent;
use crate::config::PricingConfig;
use crate::types::{AgentKind, Cash, Energy, Price, Weight};

/// Result of a forward pass for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: Price,
    /// Fuzzified input the price was computed from.
    pub input: f64,
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Saturating membership in `[0, 1]`.
///
/// - Producers: how "full" they feel; rises as energy passes the offset.
/// - Consumers: how "needy" they feel; rises as energy falls to zero.
pub fn fuzzify(energy: Energy, kind: AgentKind, config: &PricingConfig) -> f64 {
    let energy = energy as f64;
    match kind {
        AgentKind::Producer => clamp01((energy - config.producer_fuzzy_offset) / config.fuzzy_span),
        AgentKind::Consumer => clamp01((config.consumer_fuzzy_ceiling - energy) / config.fuzzy_span),
    }
}

pub fn is_night(sun: f64, config: &PricingConfig) -> bool {
    sun < config.night_threshold
}

/// Producer ask: `max(floor, floor(ceiling - fuzzy * (1 - greed) * ceiling + night_bias))`.
///
/// Greed suppresses the discount an energy-rich producer would otherwise give.
pub fn producer_quote(energy: Energy, greed: Weight, sun: f64, config: &PricingConfig) -> Quote {
    let input = fuzzify(energy, AgentKind::Producer, config);
    let night_bias = if is_night(sun, config) {
        config.night_bias
    } else {
        0.0
    };
    let activation =
        config.producer_ceiling - input * (1.0 - greed) * config.producer_ceiling + night_bias;
    let price = activation.floor().max(config.producer_floor as f64) as Price;
    Quote { price, input }
}

/// Consumer bid cap: `min(cash, floor(base + fuzzy * willingness * span))`.
pub fn consumer_quote(energy: Energy, willingness: Weight, cash: Cash, config: &PricingConfig) -> Quote {
    let input = fuzzify(energy, AgentKind::Consumer, config);
    let activation = config.consumer_base + input * willingness * config.consumer_span;
    let price = (activation.floor().max(0.0) as Price).min(cash);
    Quote { price, input }
}

/// Solar generation then a fresh ask. Generation succeeds with probability `sun`.
pub fn refresh_producer<R: Rng>(agent: &mut Agent, sun: f64, rng: &mut R, config: &PricingConfig) {
    let roll: f64 = rng.random();
    if roll < sun {
        agent.energy += config.generation;
    }
    let quote = producer_quote(agent.energy, agent.weight, sun, config);
    agent.price = quote.price;
    agent.last_input = Some(quote.input);
}

/// Burn one tick of energy then a fresh bid.
pub fn refresh_consumer(agent: &mut Agent, config: &PricingConfig) {
    agent.energy = agent.energy.saturating_sub(config.consumption);
    let quote = consumer_quote(agent.energy, agent.weight, agent.cash, config);
    agent.price = quote.price;
    agent.last_input = Some(quote.input);
}
