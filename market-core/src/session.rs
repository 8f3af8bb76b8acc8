//! The simulation loop's single owner.
//!
//! A [`Session`] holds every piece of mutable state: the world, the RNG, the
//! run state machine, the viewer's mode and speed, the latest narration and
//! the narrator queue. Hosts drive it with intents and a timer; each call runs
//! to completion before the next one can start.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::MarketConfig;
use crate::error::ConfigError;
use crate::explain::{self, Narration};
use crate::narrator::Narrator;
use crate::pricing;
use crate::state::{AgentSnapshot, StateSnapshot};
use crate::tick::{TickOutcome, run_market_tick};
use crate::types::{Mode, RunState};
use crate::world::MarketWorld;

#[derive(Debug, Clone)]
pub struct Session {
    config: MarketConfig,
    world: MarketWorld,
    rng: StdRng,
    run_state: RunState,
    mode: Mode,
    speed_ms: u32,
    narration: Narration,
    narrator: Narrator,
}

/// Fresh seed when the host does not supply one.
fn entropy_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * u64::MAX as f64) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        rand::random()
    }
}

impl Session {
    pub fn new(config: MarketConfig) -> Result<Self, ConfigError> {
        Self::with_seed(config, entropy_seed())
    }

    /// Reproducible session: same config and seed give the same run.
    pub fn with_seed(config: MarketConfig, seed: u64) -> Result<Self, ConfigError> {
        let world = MarketWorld::new(&config)?;
        let narrator = Narrator::new(&config.narrator);
        let speed_ms = config
            .schedule
            .clamp_interval(config.schedule.default_interval_ms);
        Ok(Self {
            config,
            world,
            rng: StdRng::seed_from_u64(seed),
            run_state: RunState::Idle,
            mode: Mode::None,
            speed_ms,
            narration: Narration::ready(),
            narrator,
        })
    }

    // === Accessors ===

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn world(&self) -> &MarketWorld {
        &self.world
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn speed_ms(&self) -> u32 {
        self.speed_ms
    }

    pub fn narration(&self) -> &Narration {
        &self.narration
    }

    pub fn narrator(&self) -> &Narrator {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut Narrator {
        &mut self.narrator
    }

    // === Intents ===

    /// Start/pause button. From a pending explanation it acts as resume.
    pub fn toggle_play(&mut self) -> RunState {
        match self.run_state {
            RunState::Idle => self.run_state = RunState::Running,
            RunState::Running => self.run_state = RunState::Idle,
            RunState::PausedForExplanation => self.resume(),
        }
        self.run_state
    }

    /// Mode buttons are toggles: picking the active mode returns to `None`.
    pub fn select_mode(&mut self, mode: Mode) -> Mode {
        self.mode = if self.mode == mode { Mode::None } else { mode };

        #[cfg(feature = "instrument")]
        tracing::debug!(target: "session", mode = ?self.mode, "mode changed");

        self.mode
    }

    /// Speed slider. Ignored in pro mode and while an explanation is showing.
    /// Returns whether the value was applied.
    pub fn set_speed(&mut self, interval_ms: u32) -> bool {
        if self.mode == Mode::Pro || self.run_state == RunState::PausedForExplanation {
            return false;
        }
        self.speed_ms = self.config.schedule.clamp_interval(interval_ms);
        true
    }

    /// Dismiss an explanation and keep running. No-op in any other state.
    pub fn resume(&mut self) {
        if self.run_state != RunState::PausedForExplanation {
            return;
        }
        self.narration = self.narration.clone().resumed();
        self.run_state = RunState::Running;
    }

    // === Scheduling ===

    /// Delay before the host's next timer fires, or `None` to cancel it.
    pub fn tick_interval_ms(&self) -> Option<u32> {
        if self.run_state != RunState::Running {
            return None;
        }
        Some(match self.mode {
            Mode::Classroom => self.config.schedule.classroom_interval_ms,
            Mode::None | Mode::Pro => self.speed_ms,
        })
    }

    /// Timer callback: steps only while running. A stale timer that fires
    /// after a pause does nothing.
    pub fn on_timer(&mut self) -> Option<TickOutcome> {
        (self.run_state == RunState::Running).then(|| self.step())
    }

    /// Run exactly one tick regardless of run state.
    pub fn step(&mut self) -> TickOutcome {
        let outcome = run_market_tick(&mut self.world, &self.config, &mut self.rng);

        let seller_energy = outcome
            .trade
            .as_ref()
            .and_then(|t| self.world.agent(&t.seller_id))
            .map(|a| a.energy);
        let night = pricing::is_night(outcome.sun, &self.config.pricing);
        let mut narration = explain::narrate(self.mode, &outcome, seller_energy, night);

        if narration.paused_for_explanation {
            if self.run_state == RunState::Running {
                self.run_state = RunState::PausedForExplanation;
            } else {
                // Manual step while stopped: show the explanation, nothing to pause
                narration.paused_for_explanation = false;
            }
        }

        #[cfg(feature = "instrument")]
        tracing::info!(
            target: "narration",
            tick = outcome.tick,
            title = narration.title.as_str(),
            paused = narration.paused_for_explanation,
        );

        self.narration = narration;
        for line in explain::speech_lines(&outcome) {
            self.narrator.speak(line);
        }
        outcome
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let world = &self.world;
        StateSnapshot {
            tick: world.tick,
            hour_of_day: world.hour_of_day(),
            sun_intensity: world.sun,
            is_night: pricing::is_night(world.sun, &self.config.pricing),
            producers: world.producers.iter().map(AgentSnapshot::from).collect(),
            consumers: world.consumers.iter().map(AgentSnapshot::from).collect(),
            price_history: world.history.to_vec(),
            last_trade: world.last_trade.clone(),
            narration: self.narration.clone(),
            run_state: self.run_state,
            mode: self.mode,
            speed_ms: self.speed_ms,
        }
    }
}
