// World state for the solar energy market

use crate::agents::{Agent, spawn_consumers, spawn_producers};
use crate::config::MarketConfig;
use crate::error::ConfigError;
use crate::market::{PriceHistory, Trade};
use crate::solar;
use crate::types::AgentId;

/// The single owned aggregate of mutable simulation state.
///
/// Populations are fixed at construction: nobody is added or removed during a
/// run, and construction refuses a config that would leave either empty.
#[derive(Debug, Clone)]
pub struct MarketWorld {
    pub tick: u64,
    pub sun: f64,
    pub producers: Vec<Agent>,
    pub consumers: Vec<Agent>,
    pub history: PriceHistory,
    /// Most recent clearing; reset at the start of every tick.
    pub last_trade: Option<Trade>,
}

impl MarketWorld {
    pub fn new(config: &MarketConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tick: 0,
            sun: solar::sun_intensity(0),
            producers: spawn_producers(&config.population),
            consumers: spawn_consumers(&config.population),
            history: PriceHistory::with_seed(config.history.capacity, &config.history.seed),
            last_trade: None,
        })
    }

    pub fn hour_of_day(&self) -> u64 {
        solar::hour_of_day(self.tick)
    }

    pub fn agent(&self, id: &AgentId) -> Option<&Agent> {
        self.producers
            .iter()
            .chain(&self.consumers)
            .find(|a| &a.id == id)
    }

    pub fn total_cash(&self) -> u64 {
        self.producers
            .iter()
            .chain(&self.consumers)
            .map(|a| a.cash as u64)
            .sum()
    }

    pub fn total_energy(&self) -> u64 {
        self.producers
            .iter()
            .chain(&self.consumers)
            .map(|a| a.energy as u64)
            .sum()
    }
}
