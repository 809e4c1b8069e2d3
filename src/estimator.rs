use std::collections::HashMap;
use crate::history::{BidderId, Round};

/// Predict every competitor's bid for the next round
///
/// # Arguments
/// * `self_id` - The predicting bidder, excluded from the result
/// * `previous` - Last cleared round
/// * `two_rounds_ago` - The round before it, if one exists
/// * `noise_threshold` - Consecutive bids closer than this are averaged
///
/// # Returns
/// (competitor, predicted bid) pairs in the previous round's order
///
/// A zero bid means the competitor is out (budget gone or opted out) and stays zero.
/// Small oscillations are smoothed by averaging, larger moves are tracked as they are.
pub fn estimate_competitor_bids(self_id: BidderId, previous: &Round, two_rounds_ago: Option<&Round>, noise_threshold: f64) -> Vec<(BidderId, f64)> {
    previous
        .bids
        .iter()
        .filter(|&&(id, _)| id != self_id)
        .map(|&(id, last_bid)| {
            if last_bid <= 0.0 {
                return (id, 0.0);
            }
            let predicted = match two_rounds_ago.and_then(|round| round.bid_of(id)) {
                Some(older_bid) if (last_bid - older_bid).abs() < noise_threshold => (last_bid + older_bid) / 2.0,
                _ => last_bid,
            };
            (id, predicted)
        })
        .collect()
}

/// Running spend of every competitor, as observed from the rounds' payments
/// Competitors never seen paying have spent 0.
#[derive(Debug, Clone, Default)]
pub struct CompetitorLedger {
    spent: HashMap<BidderId, f64>,
}

impl CompetitorLedger {
    pub fn new() -> Self {
        Self { spent: HashMap::new() }
    }

    /// Add the payments of one cleared round for everyone except `self_id`
    pub fn charge(&mut self, self_id: BidderId, round: &Round) {
        for &(id, _) in &round.bids {
            if id == self_id {
                continue;
            }
            let payment = round.payment_of(id);
            if payment > 0.0 {
                *self.spent.entry(id).or_insert(0.0) += payment;
            }
        }
    }

    pub fn spent(&self, bidder_id: BidderId) -> f64 {
        self.spent.get(&bidder_id).copied().unwrap_or(0.0)
    }

    /// Competitors that are out of the auction
    /// Either predicted to bid 0 or already spent `assumed_budget` (everyone is assumed to start equal)
    pub fn defaulted_count(&self, predicted_bids: &[(BidderId, f64)], assumed_budget: f64) -> usize {
        predicted_bids
            .iter()
            .filter(|&&(id, bid)| bid <= 0.0 || (assumed_budget > 0.0 && self.spent(id) >= assumed_budget))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_with_bids(bids: Vec<(BidderId, f64)>) -> Round {
        Round::new(bids, vec![10.0, 6.0, 3.0], vec![100.0, 40.0, 9.0], None)
    }

    #[test]
    fn test_single_round_passes_bids_through() {
        let previous = round_with_bids(vec![(1, 40.0), (0, 30.0), (2, 25.0)]);
        let predicted = estimate_competitor_bids(0, &previous, None, 2.0);
        assert_eq!(predicted, vec![(1, 40.0), (2, 25.0)]);
    }

    #[test]
    fn test_noise_is_averaged_and_trends_tracked() {
        let older = round_with_bids(vec![(1, 39.0), (2, 15.0)]);
        let previous = round_with_bids(vec![(1, 40.0), (2, 25.0)]);
        let predicted = estimate_competitor_bids(0, &previous, Some(&older), 2.0);
        // 1 moved by 1 (noise), 2 moved by 10 (trend)
        assert_eq!(predicted, vec![(1, 39.5), (2, 25.0)]);
    }

    #[test]
    fn test_zero_bid_stays_zero() {
        let older = round_with_bids(vec![(1, 1.0)]);
        let previous = round_with_bids(vec![(1, 0.0)]);
        let predicted = estimate_competitor_bids(0, &previous, Some(&older), 2.0);
        assert_eq!(predicted, vec![(1, 0.0)]);
    }

    #[test]
    fn test_new_competitor_without_older_bid() {
        let older = round_with_bids(vec![(1, 10.0)]);
        let previous = round_with_bids(vec![(1, 10.5), (3, 12.0)]);
        let predicted = estimate_competitor_bids(0, &previous, Some(&older), 2.0);
        assert_eq!(predicted, vec![(1, 10.25), (3, 12.0)]);
    }

    #[test]
    fn test_ledger_charges_competitors_only() {
        let mut ledger = CompetitorLedger::new();
        let round = round_with_bids(vec![(1, 40.0), (0, 30.0), (2, 25.0)]);
        ledger.charge(0, &round);
        ledger.charge(0, &round);
        assert_eq!(ledger.spent(1), 200.0);
        assert_eq!(ledger.spent(2), 18.0);
        assert_eq!(ledger.spent(0), 0.0);
        // Never seen
        assert_eq!(ledger.spent(9), 0.0);
    }

    #[test]
    fn test_defaulted_count() {
        let mut ledger = CompetitorLedger::new();
        ledger.charge(0, &round_with_bids(vec![(1, 40.0), (2, 30.0), (3, 25.0)]));
        let predicted = vec![(1, 40.0), (2, 30.0), (3, 0.0)];
        // 3 bids zero, 1 has spent the assumed budget of 100
        assert_eq!(ledger.defaulted_count(&predicted, 100.0), 2);
        assert_eq!(ledger.defaulted_count(&predicted, 1000.0), 1);
    }
}
