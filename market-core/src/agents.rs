use serde::{Deserialize, Serialize};

use crate::config::PopulationConfig;
use crate::types::{AgentId, AgentKind, Cash, Energy, Price, Weight};

// === AGENT ===

/// A producer or consumer of energy.
///
/// `weight` is the only learned parameter: greed for producers, willingness
/// for consumers. Everything else is bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub energy: Energy,
    pub cash: Cash,
    pub price: Price,
    pub weight: Weight,
    pub learning_rate: f64,
    /// Fuzzified input used for the current quote.
    pub last_input: Option<f64>,
}

impl Agent {
    pub fn new(id: AgentId, kind: AgentKind) -> Self {
        Self {
            id,
            kind,
            energy: 0,
            cash: 0,
            price: 0,
            weight: 0.5,
            learning_rate: 0.05,
            last_input: None,
        }
    }

    pub fn producer(index: usize) -> Self {
        Self::new(AgentId::new(AgentKind::Producer, index), AgentKind::Producer)
    }

    pub fn consumer(index: usize) -> Self {
        Self::new(AgentId::new(AgentKind::Consumer, index), AgentKind::Consumer)
    }

    pub fn with_energy(mut self, energy: Energy) -> Self {
        self.energy = energy;
        self
    }

    pub fn with_cash(mut self, cash: Cash) -> Self {
        self.cash = cash;
        self
    }

    pub fn with_price(mut self, price: Price) -> Self {
        self.price = price;
        self
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn is_producer(&self) -> bool {
        self.kind == AgentKind::Producer
    }

    /// Can this agent take part in matching this tick?
    pub fn can_trade(&self) -> bool {
        match self.kind {
            AgentKind::Producer => self.energy > 0,
            AgentKind::Consumer => self.cash > 0,
        }
    }
}

// === POPULATION ===

/// Build the fixed producer population. Ids run `P0..P{n-1}`.
pub fn spawn_producers(config: &PopulationConfig) -> Vec<Agent> {
    (0..config.producers)
        .map(|i| {
            Agent::producer(i)
                .with_energy(config.producer_energy)
                .with_cash(config.producer_cash)
                .with_price(config.producer_price)
                .with_weight(config.initial_weight)
                .with_learning_rate(config.learning_rate)
        })
        .collect()
}

/// Build the fixed consumer population. Ids run `C0..C{n-1}`.
pub fn spawn_consumers(config: &PopulationConfig) -> Vec<Agent> {
    (0..config.consumers)
        .map(|i| {
            Agent::consumer(i)
                .with_energy(config.consumer_energy)
                .with_cash(config.consumer_cash)
                .with_price(config.consumer_price)
                .with_weight(config.initial_weight)
                .with_learning_rate(config.learning_rate)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_population_matches_demo() {
        let config = PopulationConfig::default();
        let producers = spawn_producers(&config);
        let consumers = spawn_consumers(&config);

        let ids: Vec<_> = producers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["P0", "P1", "P2", "P3"]);
        let ids: Vec<_> = consumers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["C0", "C1", "C2", "C3"]);

        assert!(producers.iter().all(|p| p.cash == 0 && p.energy == 5 && p.price == 15));
        assert!(consumers.iter().all(|c| c.cash == 100 && c.energy == 5 && c.price == 5));
        assert!(producers.iter().chain(&consumers).all(|a| a.weight == 0.5));
    }

    #[test]
    fn test_can_trade_depends_on_kind() {
        let empty_producer = Agent::producer(0).with_cash(50);
        assert!(!empty_producer.can_trade());
        assert!(empty_producer.with_energy(1).can_trade());

        let broke_consumer = Agent::consumer(0).with_energy(3);
        assert!(!broke_consumer.can_trade());
        assert!(broke_consumer.with_cash(1).can_trade());
    }
}
