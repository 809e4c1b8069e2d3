//! Slot pricing under GSP assuming competitors hold their predicted bids.
//!
//! For each slot we derive the bid range that lands us there, the utility of
//! winning it at the bottom of that range, and the balanced bid for the slot
//! that maximizes utility.

use crate::bidder_config::TopSlotBid;
use crate::history::BidderId;
use crate::utils::argmax_index;

/// Bid range that places a bidder in one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotQuote {
    pub slot: usize,
    /// Smallest bid that ties the competitor currently holding this slot, never below reserve
    pub min_bid: f64,
    /// Smallest bid that would move us one slot higher (2 * min_bid for the top slot)
    pub max_bid: f64,
}

/// Competing bids that take part in the auction, highest first
fn ranked_competing_bids(reserve: f64, predicted_bids: &[(BidderId, f64)]) -> Vec<f64> {
    let mut ranked: Vec<f64> = predicted_bids
        .iter()
        .map(|&(_, bid)| bid)
        .filter(|&bid| bid > 0.0 && bid >= reserve)
        .collect();
    ranked.sort_by(|a, b| b.total_cmp(a));
    ranked
}

fn quote_from_ranked(slot: usize, reserve: f64, ranked: &[f64]) -> SlotQuote {
    let min_bid = ranked.get(slot).copied().unwrap_or(reserve).max(reserve);
    let max_bid = if slot == 0 {
        2.0 * min_bid
    } else {
        ranked.get(slot - 1).copied().unwrap_or(reserve).max(reserve)
    };
    SlotQuote { slot, min_bid, max_bid }
}

/// Quote one slot
/// Returns None for slots that do not exist in `clicks`
pub fn quote_slot(slot: usize, clicks: &[f64], reserve: f64, predicted_bids: &[(BidderId, f64)]) -> Option<SlotQuote> {
    if slot >= clicks.len() {
        return None;
    }
    let ranked = ranked_competing_bids(reserve, predicted_bids);
    Some(quote_from_ranked(slot, reserve, &ranked))
}

/// Quote every slot in `clicks`, top slot first
pub fn quote_slots(clicks: &[f64], reserve: f64, predicted_bids: &[(BidderId, f64)]) -> Vec<SlotQuote> {
    let ranked = ranked_competing_bids(reserve, predicted_bids);
    (0..clicks.len())
        .map(|slot| quote_from_ranked(slot, reserve, &ranked))
        .collect()
}

/// clicks[s] * (value - min_bid[s]) for every quoted slot
pub fn expected_utilities(value: f64, clicks: &[f64], quotes: &[SlotQuote]) -> Vec<f64> {
    quotes
        .iter()
        .map(|quote| clicks.get(quote.slot).copied().unwrap_or(0.0) * (value - quote.min_bid))
        .collect()
}

/// Slot with the highest utility, the higher slot wins ties
pub fn choose_target_slot(utilities: &[f64]) -> Option<usize> {
    argmax_index(utilities)
}

/// Bid that makes us indifferent between the target slot at its minimum price
/// and the slot above it at our own bid:
/// clicks[s] * (value - min_bid) = clicks[s-1] * (value - bid)
///
/// A slot above with no clicks puts no constraint on the bid, so we bid the value.
pub fn compute_balanced_bid(value: f64, quote: &SlotQuote, clicks: &[f64], top_slot_bid: TopSlotBid) -> f64 {
    if quote.min_bid >= value {
        return value;
    }
    if quote.slot == 0 {
        return match top_slot_bid {
            TopSlotBid::Value => value,
            // clicks[-1] = 2 * clicks[0]
            TopSlotBid::ClickDoubling => (value + quote.min_bid) / 2.0,
        };
    }
    let target_clicks = clicks.get(quote.slot).copied().unwrap_or(0.0);
    let above_clicks = clicks.get(quote.slot - 1).copied().unwrap_or(0.0);
    if above_clicks <= 0.0 {
        return value;
    }
    value - target_clicks * (value - quote.min_bid) / above_clicks
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLICKS: [f64; 3] = [10.0, 6.0, 3.0];

    fn competitors() -> Vec<(BidderId, f64)> {
        vec![(1, 25.0), (2, 40.0), (3, 8.0)]
    }

    #[test]
    fn test_quotes_follow_ranked_competitors() {
        let quotes = quote_slots(&CLICKS, 10.0, &competitors());
        // 8 is below reserve and does not compete
        assert_eq!(quotes, vec![
            SlotQuote { slot: 0, min_bid: 40.0, max_bid: 80.0 },
            SlotQuote { slot: 1, min_bid: 25.0, max_bid: 40.0 },
            SlotQuote { slot: 2, min_bid: 10.0, max_bid: 25.0 },
        ]);
        assert_eq!(quote_slot(1, &CLICKS, 10.0, &competitors()), Some(quotes[1]));
    }

    #[test]
    fn test_no_quote_beyond_available_slots() {
        assert_eq!(quote_slot(3, &CLICKS, 10.0, &competitors()), None);
        assert!(quote_slots(&[], 10.0, &competitors()).is_empty());
    }

    #[test]
    fn test_min_bid_never_below_reserve() {
        let quotes = quote_slots(&CLICKS, 5.0, &[(1, 0.0), (2, 3.0)]);
        for quote in &quotes {
            assert!(quote.min_bid >= 5.0);
        }
        assert_eq!(quotes[0].max_bid, 10.0);
    }

    #[test]
    fn test_scenario_value_100_targets_top_slot() {
        let quotes = quote_slots(&CLICKS, 10.0, &competitors());
        let utilities = expected_utilities(100.0, &CLICKS, &quotes);
        assert_eq!(utilities, vec![600.0, 450.0, 270.0]);
        assert_eq!(choose_target_slot(&utilities), Some(0));
    }

    #[test]
    fn test_lower_slot_wins_when_top_is_expensive() {
        let quotes = quote_slots(&CLICKS, 10.0, &competitors());
        let utilities = expected_utilities(45.0, &CLICKS, &quotes);
        // 10*5, 6*20, 3*35
        assert_eq!(utilities, vec![50.0, 120.0, 105.0]);
        assert_eq!(choose_target_slot(&utilities), Some(1));
    }

    #[test]
    fn test_ties_prefer_higher_slot() {
        assert_eq!(choose_target_slot(&[120.0, 120.0, 30.0]), Some(0));
        assert_eq!(choose_target_slot(&[10.0, 120.0, 120.0]), Some(1));
        assert_eq!(choose_target_slot(&[]), None);
    }

    #[test]
    fn test_balanced_bid_for_middle_slot() {
        let quote = SlotQuote { slot: 1, min_bid: 25.0, max_bid: 40.0 };
        // 45 - 6 * (45 - 25) / 10 = 33
        let bid = compute_balanced_bid(45.0, &quote, &CLICKS, TopSlotBid::Value);
        assert!((bid - 33.0).abs() < 1e-9);
        assert!(bid >= quote.min_bid && bid <= 45.0);
    }

    #[test]
    fn test_top_slot_conventions() {
        let quote = SlotQuote { slot: 0, min_bid: 40.0, max_bid: 80.0 };
        assert_eq!(compute_balanced_bid(100.0, &quote, &CLICKS, TopSlotBid::Value), 100.0);
        assert_eq!(compute_balanced_bid(100.0, &quote, &CLICKS, TopSlotBid::ClickDoubling), 70.0);
    }

    #[test]
    fn test_unaffordable_slot_bids_value() {
        let quote = SlotQuote { slot: 1, min_bid: 60.0, max_bid: 80.0 };
        assert_eq!(compute_balanced_bid(50.0, &quote, &CLICKS, TopSlotBid::ClickDoubling), 50.0);
    }

    #[test]
    fn test_zero_clicks_above_is_unconstrained() {
        let quote = SlotQuote { slot: 1, min_bid: 10.0, max_bid: 20.0 };
        assert_eq!(compute_balanced_bid(50.0, &quote, &[0.0, 0.0], TopSlotBid::Value), 50.0);
    }
}
