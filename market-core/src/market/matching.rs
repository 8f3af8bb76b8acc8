use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tsify_next::Tsify;

use crate::agents::Agent;
use crate::types::{AgentId, Orientation, Price};

// === TRADE ===

/// A cleared deal. At most one exists per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tsify)]
#[tsify(into_wasm_abi)]
pub struct Trade {
    #[tsify(type = "string")]
    pub seller_id: AgentId,
    #[tsify(type = "string")]
    pub buyer_id: AgentId,
    pub price: Price,
    pub ask: Price,
    pub bid: Price,
    /// Animation direction; presentation only.
    pub orientation: Orientation,
}

/// Midpoint rule, rounded down.
pub fn midpoint(bid: Price, ask: Price) -> Price {
    (bid + ask) / 2
}

// === FIRST-FIT SCAN ===

/// Scan sellers in the given order, and for each seller scan buyers in the
/// given order. The first buyer whose bid meets the seller's ask wins and the
/// whole scan stops.
///
/// Returns `(seller_index, buyer_index)` into `producers` / `consumers`.
pub fn first_fit(
    producers: &[Agent],
    consumers: &[Agent],
    seller_order: &[usize],
    buyer_order: &[usize],
) -> Option<(usize, usize)> {
    for &s in seller_order {
        let ask = producers[s].price;
        if let Some(&b) = buyer_order.iter().find(|&&b| consumers[b].price >= ask) {
            return Some((s, b));
        }
    }
    None
}

/// Indices of agents eligible to trade, in population order.
fn eligible(agents: &[Agent]) -> Vec<usize> {
    agents
        .iter()
        .enumerate()
        .filter(|(_, a)| a.can_trade())
        .map(|(i, _)| i)
        .collect()
}

/// Move one unit of energy from seller to buyer and the price back the other way.
pub fn settle(seller: &mut Agent, buyer: &mut Agent, price: Price) {
    debug_assert!(seller.energy > 0, "seller {} has no energy", seller.id);
    debug_assert!(buyer.cash >= price, "buyer {} cannot afford {}", buyer.id, price);
    seller.energy -= 1;
    seller.cash += price;
    buyer.energy += 1;
    buyer.cash -= price;
}

/// Randomized double auction clearing at most one trade.
///
/// Sellers are producers with energy, buyers are consumers with cash. Both
/// lists are independently shuffled (Fisher-Yates) before the first-fit scan.
pub fn clear_one<R: Rng>(
    producers: &mut [Agent],
    consumers: &mut [Agent],
    rng: &mut R,
) -> Option<Trade> {
    let mut sellers = eligible(producers);
    let mut buyers = eligible(consumers);
    if sellers.is_empty() || buyers.is_empty() {
        return None;
    }
    sellers.shuffle(rng);
    buyers.shuffle(rng);

    let (s, b) = first_fit(producers, consumers, &sellers, &buyers)?;
    let seller = &mut producers[s];
    let buyer = &mut consumers[b];
    let ask = seller.price;
    let bid = buyer.price;
    let price = midpoint(bid, ask);
    settle(seller, buyer, price);

    let orientation = if rng.random_bool(0.5) {
        Orientation::Right
    } else {
        Orientation::Left
    };

    Some(Trade {
        seller_id: seller.id.clone(),
        buyer_id: buyer.id.clone(),
        price,
        ask,
        bid,
        orientation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn seller(i: usize, price: Price) -> Agent {
        Agent::producer(i).with_energy(5).with_price(price)
    }

    fn buyer(i: usize, price: Price) -> Agent {
        Agent::consumer(i).with_cash(100).with_price(price)
    }

    #[test]
    fn test_midpoint_rounds_down() {
        assert_eq!(midpoint(12, 10), 11);
        assert_eq!(midpoint(12, 9), 10);
        assert_eq!(midpoint(7, 7), 7);
    }

    #[test]
    fn test_first_fit_takes_first_compatible_buyer_not_best() {
        let producers = vec![seller(0, 10), seller(1, 3)];
        let consumers = vec![buyer(0, 4), buyer(1, 11), buyer(2, 20)];

        // Seller 0 scans buyers in order 0, 2, 1: buyer 0 is too low, buyer 2 fits first
        let hit = first_fit(&producers, &consumers, &[0, 1], &[0, 2, 1]);
        assert_eq!(hit, Some((0, 2)));

        // Seller 1 first: buyer 0 already fits even though cheaper seller/higher buyer exist
        let hit = first_fit(&producers, &consumers, &[1, 0], &[0, 1, 2]);
        assert_eq!(hit, Some((1, 0)));
    }

    #[test]
    fn test_first_fit_moves_to_next_seller() {
        let producers = vec![seller(0, 30), seller(1, 8)];
        let consumers = vec![buyer(0, 9)];
        assert_eq!(first_fit(&producers, &consumers, &[0, 1], &[0]), Some((1, 0)));
    }

    #[test]
    fn test_no_compatible_pair() {
        let mut producers = vec![seller(0, 17), seller(1, 15)];
        let mut consumers = vec![buyer(0, 12), buyer(1, 5)];
        let mut rng = StdRng::seed_from_u64(1);
        assert!(clear_one(&mut producers, &mut consumers, &mut rng).is_none());
        assert!(producers.iter().all(|p| p.energy == 5 && p.cash == 0));
        assert!(consumers.iter().all(|c| c.cash == 100));
    }

    #[test]
    fn test_clear_one_settles_exactly_one_trade() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let mut producers = vec![seller(0, 5), seller(1, 6), seller(2, 7)];
            let mut consumers = vec![buyer(0, 10), buyer(1, 12), buyer(2, 11)];
            let trade = clear_one(&mut producers, &mut consumers, &mut rng).unwrap();

            assert!(trade.price >= trade.ask && trade.price <= trade.bid);
            let energy_out: u32 = producers.iter().map(|p| 5 - p.energy).sum();
            let energy_in: u32 = consumers.iter().map(|c| c.energy).sum();
            assert_eq!(energy_out, 1);
            assert_eq!(energy_in, 1);

            let seller = producers.iter().find(|p| p.id == trade.seller_id).unwrap();
            assert_eq!(seller.cash, trade.price);
            let buyer = consumers.iter().find(|c| c.id == trade.buyer_id).unwrap();
            assert_eq!(buyer.cash, 100 - trade.price);
        }
    }

    #[test]
    fn test_ineligible_agents_are_skipped() {
        let mut producers = vec![seller(0, 2).with_energy(0), seller(1, 9)];
        let mut consumers = vec![buyer(0, 50).with_cash(0), buyer(1, 9)];
        let mut rng = StdRng::seed_from_u64(3);
        let trade = clear_one(&mut producers, &mut consumers, &mut rng).unwrap();
        assert_eq!(trade.seller_id.as_str(), "P1");
        assert_eq!(trade.buyer_id.as_str(), "C1");
        assert_eq!(trade.price, 9);
    }

    #[test]
    fn test_drained_sellers_clear_nothing() {
        let mut producers = vec![seller(0, 2).with_energy(0), seller(1, 3).with_energy(0)];
        let mut consumers = vec![buyer(0, 50), buyer(1, 40)];
        let mut rng = StdRng::seed_from_u64(8);

        assert!(clear_one(&mut producers, &mut consumers, &mut rng).is_none());
        assert!(producers.iter().all(|p| p.energy == 0 && p.cash == 0));
        assert!(consumers.iter().all(|c| c.energy == 0 && c.cash == 100));
    }

    #[test]
    fn test_broke_buyers_clear_nothing() {
        let mut producers = vec![seller(0, 2), seller(1, 3)];
        let mut consumers = vec![buyer(0, 50).with_cash(0), buyer(1, 40).with_cash(0)];
        let mut rng = StdRng::seed_from_u64(8);

        assert!(clear_one(&mut producers, &mut consumers, &mut rng).is_none());
        assert!(producers.iter().all(|p| p.energy == 5 && p.cash == 0));
        assert!(consumers.iter().all(|c| c.energy == 0 && c.cash == 0));
    }

    #[test]
    fn test_shuffle_reaches_every_seller() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let mut producers: Vec<_> = (0..4).map(|i| seller(i, 5)).collect();
            let mut consumers = vec![buyer(0, 10)];
            let trade = clear_one(&mut producers, &mut consumers, &mut rng).unwrap();
            seen.insert(trade.seller_id);
        }
        assert_eq!(seen.len(), 4);
    }
}
