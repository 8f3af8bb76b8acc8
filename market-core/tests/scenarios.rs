use market_core::pricing::producer_quote;
use market_core::{
    FailureSelection, MarketConfig, MarketWorld, Mode, RunState, Session, run_market_tick,
    sun_intensity,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn scenario_noon_producer_price() {
    let config = MarketConfig::default();
    let sun = sun_intensity(12);
    assert_eq!(sun, 1.0);

    // fuzzy = (5 - 2) / 10 = 0.3 -> floor(15 - 0.3 * 0.5 * 15) = floor(12.75)
    let quote = producer_quote(5, 0.5, sun, &config.pricing);
    assert!((quote.input - 0.3).abs() < 1e-12);
    assert_eq!(quote.price, 12);
}

#[test]
fn scenario_night_producer_price_carries_bias() {
    let config = MarketConfig::default();
    let sun = sun_intensity(2);
    assert_eq!(sun, 0.0);

    // floor(15 - 2.25 + 5) = 17
    assert_eq!(producer_quote(5, 0.5, sun, &config.pricing).price, 17);
}

#[test]
fn scenario_first_night_tick_clears_nothing() {
    // Tick 1 is dark: producers keep energy 5 and ask 17, consumers drop to
    // energy 4 and bid floor(5 + 0.6 * 0.5 * 15) = 9. Nobody meets the ask.
    let config = MarketConfig::default();
    let mut world = MarketWorld::new(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let outcome = run_market_tick(&mut world, &config, &mut rng);

    assert!(outcome.trade.is_none());
    assert!(world.producers.iter().all(|p| p.price == 17 && p.energy == 5));
    assert!(world.consumers.iter().all(|c| c.price == 9 && c.energy == 4));
    assert_eq!(world.history.to_vec(), vec![10, 10, 10, 10]);

    let update = outcome.learning.expect("no-trade tick must adjust a weight");
    assert_eq!(update.agent_id.as_str(), "P0");
    assert_eq!(update.old_weight, 0.5);
    assert!((update.new_weight - 0.495).abs() < 1e-12);
    assert!((world.producers[0].weight - 0.495).abs() < 1e-12);
    assert!(world.producers[1..].iter().all(|p| p.weight == 0.5));
}

#[test]
fn scenario_whole_night_only_punishes_first_producer() {
    let config = MarketConfig::default();
    let mut world = MarketWorld::new(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    // Hours 1..=5 are dark for every seed.
    for _ in 0..5 {
        let outcome = run_market_tick(&mut world, &config, &mut rng);
        assert!(outcome.trade.is_none(), "tick {} traded at night", outcome.tick);
    }
    assert!((world.producers[0].weight - 0.475).abs() < 1e-9);
    assert!(world.producers[1..].iter().all(|p| p.weight == 0.5));
    assert_eq!(world.history.len(), 8);
    assert!(world.history.to_vec().iter().all(|&p| p == 10));
}

#[test]
fn scenario_highest_ask_selection_blames_priciest_producer() {
    let mut config = MarketConfig::default();
    config.learning.selection = FailureSelection::HighestAsk;
    let mut world = MarketWorld::new(&config).unwrap();
    world.producers[2].weight = 0.9;
    let mut rng = StdRng::seed_from_u64(1);

    let outcome = run_market_tick(&mut world, &config, &mut rng);
    let update = outcome.learning.expect("night tick has no trade");
    assert_eq!(update.agent_id.as_str(), "P2");
}

#[test]
fn scenario_daylight_eventually_trades() {
    let config = MarketConfig::default();
    let mut world = MarketWorld::new(&config).unwrap();
    let mut rng = StdRng::seed_from_u64(9);

    let trades = (0..48)
        .filter_map(|_| run_market_tick(&mut world, &config, &mut rng).trade)
        .collect::<Vec<_>>();
    assert!(!trades.is_empty(), "two full days should clear at least one trade");
    for trade in &trades {
        assert!(trade.bid >= trade.ask);
        assert!(trade.price >= trade.ask && trade.price <= trade.bid);
        assert_eq!(trade.price, (trade.ask + trade.bid) / 2);
    }
}

#[test]
fn scenario_pro_mode_explains_then_resumes() {
    let mut session = Session::with_seed(MarketConfig::default(), 17).unwrap();
    session.select_mode(Mode::Pro);
    session.toggle_play();

    let outcome = session.on_timer().expect("running session steps");
    assert!(outcome.learning.is_some());
    assert_eq!(session.run_state(), RunState::PausedForExplanation);
    assert_eq!(session.narration().title, "BACKPROPAGATION (Error Correction)");
    assert_eq!(
        session.narration().highlight_id.as_ref().map(|id| id.as_str()),
        Some("P0")
    );

    session.resume();
    assert_eq!(session.run_state(), RunState::Running);
    assert_eq!(session.tick_interval_ms(), Some(2000));
}

#[test]
fn scenario_config_from_json_overrides_defaults() {
    let json = r#"{
        "population": { "producers": 2, "consumers": 6 },
        "schedule": { "default_interval_ms": 9000 }
    }"#;
    let config = MarketConfig::from_json(json).unwrap();
    let session = Session::with_seed(config, 4).unwrap();

    assert_eq!(session.world().producers.len(), 2);
    assert_eq!(session.world().consumers.len(), 6);
    assert_eq!(session.world().consumers[5].id.as_str(), "C5");
    // Out-of-range default speed is clamped to the slider maximum.
    assert_eq!(session.speed_ms(), 3000);
}

#[test]
fn scenario_rejects_empty_population() {
    let err = MarketConfig::from_json(r#"{ "population": { "consumers": 0 } }"#).unwrap_err();
    assert!(err.to_string().contains("consumer"), "{err}");
}
