use std::collections::VecDeque;

use crate::types::Price;

/// Bounded trail of clearing prices for the chart. Oldest values are evicted
/// first. Never read back by pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistory {
    prices: VecDeque<Price>,
    capacity: usize,
}

impl PriceHistory {
    /// A zero capacity is raised to one so the bound always holds.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            prices: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn with_seed(capacity: usize, seed: &[Price]) -> Self {
        let mut history = Self::new(capacity);
        for &price in seed {
            history.push(price);
        }
        history
    }

    fn push(&mut self, price: Price) {
        if self.prices.len() == self.capacity {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// Append this tick's clearing price, or repeat the last one if nothing cleared.
    /// An empty history stays empty until the first trade.
    pub fn record(&mut self, clearing: Option<Price>) {
        if let Some(price) = clearing.or_else(|| self.last()) {
            self.push(price);
        }
    }

    pub fn last(&self) -> Option<Price> {
        self.prices.back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Price> {
        self.prices.iter().copied().collect()
    }
}
