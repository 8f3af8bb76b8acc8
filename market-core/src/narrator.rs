//! Best-effort speech feed.
//!
//! The engine pushes lines; the host pops them one at a time whenever its
//! speech engine is idle. Nothing here can block or fail a tick: a full queue
//! drops its oldest line, a disabled narrator drops everything.

use std::collections::VecDeque;

use crate::config::NarratorConfig;

#[derive(Debug, Clone)]
pub struct Narrator {
    enabled: bool,
    queue: VecDeque<String>,
    capacity: usize,
    dropped: u64,
}

impl Narrator {
    pub fn new(config: &NarratorConfig) -> Self {
        Self {
            enabled: false,
            queue: VecDeque::new(),
            capacity: config.queue_capacity.max(1),
            dropped: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.stop();
        }
        self.enabled = enabled;
    }

    /// Flip the narrator; turning it off also silences anything queued.
    pub fn toggle(&mut self) -> bool {
        self.set_enabled(!self.enabled);
        self.enabled
    }

    /// Queue a line behind whatever is already waiting.
    pub fn speak(&mut self, text: impl Into<String>) {
        if !self.enabled {
            return;
        }
        if self.queue.len() == self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(text.into());
    }

    /// Drop everything waiting and say this next.
    pub fn speak_now(&mut self, text: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.queue.clear();
        self.queue.push_back(text.into());
    }

    pub fn stop(&mut self) {
        self.queue.clear();
    }

    pub fn next_utterance(&mut self) -> Option<String> {
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Lines evicted because the host fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
