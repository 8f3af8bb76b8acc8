use rand::Rng;

use crate::config::MarketConfig;
use crate::learning::{self, LearningUpdate};
use crate::market::{self, Trade};
use crate::pricing;
use crate::solar::{self, SunTransition};
use crate::world::MarketWorld;

/// What happened during one step. Feeds the explainer and the narrator.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tick: u64,
    pub hour: u64,
    pub sun: f64,
    pub trade: Option<Trade>,
    pub learning: Option<LearningUpdate>,
    pub transition: Option<SunTransition>,
}

impl TickOutcome {
    /// Something a viewer would want explained: a sale or a weight update.
    pub fn is_narratable(&self) -> bool {
        self.trade.is_some() || self.learning.is_some()
    }
}

// === FULL TICK ===

/*
1. Advance clock, derive sun
2. Producers: solar generation -> forward pass (ask)
3. Consumers: burn energy -> forward pass (bid)
4. Matching: at most one trade
5. Learning: only if nothing cleared
6. Price history
*/

/// Advance the world by one hour. Runs to completion; never fails.
pub fn run_market_tick<R: Rng>(
    world: &mut MarketWorld,
    config: &MarketConfig,
    rng: &mut R,
) -> TickOutcome {
    world.tick += 1;
    world.last_trade = None;
    let tick = world.tick;

    // 1. SOLAR CLOCK
    let sun = solar::sun_intensity(tick);
    world.sun = sun;
    let hour = solar::hour_of_day(tick);
    let transition = solar::sun_transition(tick);

    // 2. PRODUCERS
    for producer in world.producers.iter_mut() {
        pricing::refresh_producer(producer, sun, rng, &config.pricing);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "quote",
            tick = tick,
            agent_id = producer.id.as_str(),
            kind = "producer",
            energy = producer.energy as u64,
            input = producer.last_input.unwrap_or_default(),
            weight = producer.weight,
            price = producer.price as u64,
        );
    }

    // 3. CONSUMERS
    for consumer in world.consumers.iter_mut() {
        pricing::refresh_consumer(consumer, &config.pricing);

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "quote",
            tick = tick,
            agent_id = consumer.id.as_str(),
            kind = "consumer",
            energy = consumer.energy as u64,
            input = consumer.last_input.unwrap_or_default(),
            weight = consumer.weight,
            price = consumer.price as u64,
        );
    }

    // 4. MATCHING
    let trade = market::clear_one(&mut world.producers, &mut world.consumers, rng);

    #[cfg(feature = "instrument")]
    {
        if let Some(t) = &trade {
            tracing::info!(
                target: "trade",
                tick = tick,
                hour = hour,
                seller_id = t.seller_id.as_str(),
                buyer_id = t.buyer_id.as_str(),
                ask = t.ask as u64,
                bid = t.bid as u64,
                price = t.price as u64,
            );
        }
    }

    // 5. LEARNING (failure only)
    let learning = if trade.is_none() {
        let update = learning::apply_error_correction(&mut world.producers, &config.learning);
        assert!(
            update.is_some(),
            "tick {tick}: no producer to correct, the producer population is empty"
        );

        #[cfg(feature = "instrument")]
        {
            if let Some(u) = &update {
                tracing::info!(
                    target: "learning",
                    tick = tick,
                    hour = hour,
                    agent_id = u.agent_id.as_str(),
                    price = u.price as u64,
                    old_weight = u.old_weight,
                    new_weight = u.new_weight,
                );
            }
        }
        update
    } else {
        None
    };

    // 6. PRICE HISTORY
    world.history.record(trade.as_ref().map(|t| t.price));
    world.last_trade = trade.clone();

    #[cfg(feature = "instrument")]
    tracing::info!(
        target: "tick",
        tick = tick,
        hour = hour,
        sun = sun,
        traded = trade.is_some(),
        chart_price = world.history.last().unwrap_or_default() as u64,
        total_cash = world.total_cash(),
        total_energy = world.total_energy(),
    );

    TickOutcome {
        tick,
        hour,
        sun,
        trade,
        learning,
        transition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_tick_advances_clock_and_clears_last_trade() {
        let config = MarketConfig::default();
        let mut world = MarketWorld::new(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(11);

        for expected in 1..=30u64 {
            let outcome = run_market_tick(&mut world, &config, &mut rng);
            assert_eq!(outcome.tick, expected);
            assert_eq!(outcome.hour, expected % 24);
            assert_eq!(world.last_trade, outcome.trade);
            // Exactly one of trade / learning per tick
            assert!(outcome.trade.is_some() != outcome.learning.is_some());
        }
    }

    #[test]
    fn test_night_without_buyers_triggers_learning() {
        // Consumers with cash but tiny bids: nothing can clear at night (asks >= 2 + bias)
        let mut config = MarketConfig::default();
        config.pricing.consumer_base = 0.0;
        config.pricing.consumer_span = 0.0;
        let mut world = MarketWorld::new(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let outcome = run_market_tick(&mut world, &config, &mut rng);
        assert!(outcome.trade.is_none());
        let update = outcome.learning.unwrap();
        assert_eq!(update.agent_id.as_str(), "P0");
        assert!((world.producers[0].weight - 0.495).abs() < 1e-12);
        assert_eq!(world.history.to_vec(), vec![10, 10, 10, 10]);
    }

    #[test]
    fn test_trade_conserves_cash_and_energy_flow() {
        let config = MarketConfig::default();
        let mut world = MarketWorld::new(&config).unwrap();
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..200 {
            let cash_before = world.total_cash();
            run_market_tick(&mut world, &config, &mut rng);
            assert_eq!(world.total_cash(), cash_before, "cash only moves between agents");
        }
    }

    #[test]
    fn test_drained_producers_still_learn() {
        let config = MarketConfig::default();
        let mut world = MarketWorld::new(&config).unwrap();
        for p in world.producers.iter_mut() {
            p.energy = 0;
        }
        let mut rng = StdRng::seed_from_u64(13);

        // Hour 1 is dark, so nobody generates and no seller is eligible.
        let outcome = run_market_tick(&mut world, &config, &mut rng);
        assert!(outcome.trade.is_none());
        assert!(world.producers.iter().all(|p| p.energy == 0));
        let update = outcome.learning.unwrap();
        assert_eq!(update.agent_id.as_str(), "P0");
        assert!((world.producers[0].weight - 0.495).abs() < 1e-12);
        assert_eq!(world.total_cash(), 400);
    }

    #[test]
    #[should_panic(expected = "producer population is empty")]
    fn test_empty_producers_fail_loudly() {
        let config = MarketConfig::default();
        let mut world = MarketWorld::new(&config).unwrap();
        world.producers.clear();
        let mut rng = StdRng::seed_from_u64(1);
        run_market_tick(&mut world, &config, &mut rng);
    }
}
