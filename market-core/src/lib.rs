use wasm_bindgen::prelude::*;

mod agents;
mod config;
mod error;
mod explain;
mod learning;
mod market;
mod narrator;
pub mod pricing;
mod session;
mod solar;
mod state;
mod tick;
mod types;
mod world;

#[cfg(feature = "instrument")]
pub use instrument;

pub use agents::*;
pub use config::*;
pub use error::*;
pub use explain::*;
pub use learning::*;
pub use market::*;
pub use narrator::*;
pub use session::*;
pub use solar::*;
pub use state::*;
pub use tick::*;
pub use types::*;
pub use world::*;

// ============================================================================
// WASM API - Simulation
// ============================================================================

/// Handle the renderer holds. It sends intents in and reads snapshots out;
/// it never edits simulation state directly.
#[wasm_bindgen]
pub struct Simulation {
    session: Session,
}

#[wasm_bindgen]
impl Simulation {
    /// Default classroom world. Pass a seed for a reproducible run.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Result<Simulation, JsError> {
        // Better panic messages in browser console
        console_error_panic_hook::set_once();
        Self::build(MarketConfig::default(), seed)
    }

    /// Build from a plain JS object shaped like `MarketConfig`.
    #[wasm_bindgen]
    pub fn with_config(config: JsValue, seed: Option<u64>) -> Result<Simulation, JsError> {
        console_error_panic_hook::set_once();
        let config: MarketConfig = serde_wasm_bindgen::from_value(config)?;
        Self::build(config, seed)
    }

    #[wasm_bindgen]
    pub fn with_config_json(json: &str, seed: Option<u64>) -> Result<Simulation, JsError> {
        console_error_panic_hook::set_once();
        let config = MarketConfig::from_json(json)?;
        Self::build(config, seed)
    }

    // === Intents ===

    #[wasm_bindgen]
    pub fn toggle_play(&mut self) -> RunState {
        self.session.toggle_play()
    }

    #[wasm_bindgen]
    pub fn select_mode(&mut self, mode: Mode) -> Mode {
        self.session.select_mode(mode)
    }

    /// Returns false when the slider is locked (pro mode or explanation showing).
    #[wasm_bindgen]
    pub fn set_speed(&mut self, interval_ms: u32) -> bool {
        self.session.set_speed(interval_ms)
    }

    #[wasm_bindgen]
    pub fn resume(&mut self) {
        self.session.resume();
    }

    // === Loop ===

    /// Milliseconds until the next timer, or `undefined` to cancel it.
    #[wasm_bindgen]
    pub fn tick_interval_ms(&self) -> Option<u32> {
        self.session.tick_interval_ms()
    }

    /// Timer callback. Returns whether a tick ran.
    #[wasm_bindgen]
    pub fn on_timer(&mut self) -> bool {
        self.session.on_timer().is_some()
    }

    /// Single-step regardless of run state.
    #[wasm_bindgen]
    pub fn step(&mut self) {
        self.session.step();
    }

    #[wasm_bindgen]
    pub fn get_tick(&self) -> u64 {
        self.session.world().tick
    }

    /// Get a snapshot of the current state for rendering
    #[wasm_bindgen]
    pub fn snapshot(&self) -> StateSnapshot {
        self.session.snapshot()
    }

    // === Narrator ===

    #[wasm_bindgen]
    pub fn toggle_narrator(&mut self) -> bool {
        self.session.narrator_mut().toggle()
    }

    #[wasm_bindgen]
    pub fn set_narrator_enabled(&mut self, enabled: bool) {
        self.session.narrator_mut().set_enabled(enabled);
    }

    /// Next line for the speech engine; call again when it finishes speaking.
    #[wasm_bindgen]
    pub fn next_utterance(&mut self) -> Option<String> {
        self.session.narrator_mut().next_utterance()
    }

    /// Interrupt whatever is queued and say `text` next.
    #[wasm_bindgen]
    pub fn announce(&mut self, text: &str) {
        self.session.narrator_mut().speak_now(text);
    }

    /// Lines dropped because the host fell behind the queue.
    #[wasm_bindgen]
    pub fn dropped_utterances(&self) -> u64 {
        self.session.narrator().dropped()
    }

    #[wasm_bindgen]
    pub fn stop_narration(&mut self) {
        self.session.narrator_mut().stop();
    }

    #[wasm_bindgen]
    pub fn narrator_options(&self) -> NarratorConfig {
        self.session.config().narrator.clone()
    }
}

impl Simulation {
    fn build(config: MarketConfig, seed: Option<u64>) -> Result<Simulation, JsError> {
        let session = match seed {
            Some(seed) => Session::with_seed(config, seed)?,
            None => Session::new(config)?,
        };
        Ok(Simulation { session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_handle_drives_session() {
        let mut sim = Simulation::build(MarketConfig::default(), Some(8)).ok().unwrap();
        assert_eq!(sim.tick_interval_ms(), None);
        assert!(!sim.on_timer());

        assert_eq!(sim.toggle_play(), RunState::Running);
        assert!(sim.on_timer());
        assert_eq!(sim.get_tick(), 1);

        sim.step();
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 2);
        assert_eq!(snap.run_state, RunState::Running);
    }

    #[test]
    fn test_narrator_toggle_through_handle() {
        let mut sim = Simulation::build(MarketConfig::default(), Some(8)).ok().unwrap();
        assert!(sim.toggle_narrator());
        sim.step();
        assert!(sim.next_utterance().is_some());
        sim.stop_narration();
        assert!(sim.next_utterance().is_none());
        assert_eq!(sim.narrator_options().lang, "es");
    }

    #[test]
    fn test_announce_interrupts_and_drops_are_counted() {
        let mut sim = Simulation::build(MarketConfig::default(), Some(8)).ok().unwrap();
        sim.set_narrator_enabled(true);
        // At least one line per tick against a queue of 16
        for _ in 0..24 {
            sim.step();
        }
        assert!(sim.dropped_utterances() >= 8);

        sim.announce("Hola");
        assert_eq!(sim.next_utterance().as_deref(), Some("Hola"));
        assert!(sim.next_utterance().is_none());
    }
}
