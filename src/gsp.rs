//! Reference Generalized Second Price clearing used by the simulation harness.
//!
//! Bidders are ranked by bid, the top ones get slots in order, and the occupant of slot k pays
//! the next ranked bid (or the reserve, for the last ranked bidder) per click.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use crate::history::{BidderId, Round};

/// Rank bids highest first, ties broken by a random shuffle
/// Bids that do not compete (zero or below reserve) follow the competing ones
pub fn rank_bids(bids: &[(BidderId, f64)], reserve: f64, rng: &mut StdRng) -> (Vec<(BidderId, f64)>, usize) {
    let mut ranked = bids.to_vec();
    ranked.shuffle(rng);
    // Stable sort keeps the shuffled order among equal bids
    ranked.sort_by(|a, b| {
        let a_competes = competes(a.1, reserve);
        let b_competes = competes(b.1, reserve);
        b_competes.cmp(&a_competes).then(b.1.total_cmp(&a.1))
    });
    let competing = ranked.iter().filter(|&&(_, bid)| competes(bid, reserve)).count();
    (ranked, competing)
}

fn competes(bid: f64, reserve: f64) -> bool {
    bid > 0.0 && bid >= reserve
}

/// Per-click price for each allocated slot
/// `ranked` holds the competing bids only, highest first
pub fn per_click_prices(ranked: &[(BidderId, f64)], num_allocated: usize, reserve: f64) -> Vec<f64> {
    (0..num_allocated)
        .map(|slot| ranked.get(slot + 1).map_or(reserve, |&(_, bid)| bid).max(reserve))
        .collect()
}

/// Clear one round
///
/// # Arguments
/// * `bids` - Bids of every bidder, in any order
/// * `clicks` - Clicks of every slot, top slot first
/// * `reserve` - Minimum legal bid
/// * `rng` - Tie breaking
///
/// # Returns
/// The Round with bids in slot order, occupants and uncapped payments
pub fn clear(bids: &[(BidderId, f64)], clicks: &[f64], reserve: f64, rng: &mut StdRng) -> Round {
    let (ranked, competing) = rank_bids(bids, reserve, rng);
    let num_allocated = competing.min(clicks.len());
    let prices = per_click_prices(&ranked[..competing], num_allocated, reserve);
    let slot_payments = prices
        .iter()
        .zip(clicks.iter())
        .map(|(price, slot_clicks)| price * slot_clicks)
        .collect();
    let occupants = ranked[..num_allocated].iter().map(|&(id, _)| id).collect();
    Round::new(ranked, clicks.to_vec(), slot_payments, Some(occupants))
}
