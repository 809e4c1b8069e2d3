//! Round records produced by the auction and the append-only history of them.
//!
//! Rounds are numbered from 1. There is no round 0: the first round of a day
//! has no history at all and bidders must use their initial bid.

/// Identifier of a bidder within one marketplace (index into Bidders)
pub type BidderId = usize;

/// One cleared auction round
/// Immutable once appended to a History
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    /// (bidder, bid) pairs in slot order, highest bid first
    pub bids: Vec<(BidderId, f64)>,
    /// Clicks per slot, slot 0 being the top slot. One entry per slot, occupied or not.
    pub clicks: Vec<f64>,
    /// Total amount charged to the occupant of each slot
    pub slot_payments: Vec<f64>,
    /// Bidders occupying each slot, when the auction reports them
    pub occupants: Option<Vec<BidderId>>,
}

impl Round {
    pub fn new(bids: Vec<(BidderId, f64)>, clicks: Vec<f64>, slot_payments: Vec<f64>, occupants: Option<Vec<BidderId>>) -> Self {
        Self {
            bids,
            clicks,
            slot_payments,
            occupants,
        }
    }

    pub fn num_slots(&self) -> usize {
        self.clicks.len()
    }

    /// Slot won by the bidder in this round
    /// Uses occupants when present, otherwise the bidder's position in the slot-ordered bids
    /// as long as a payment was recorded for that position
    pub fn slot_of(&self, bidder_id: BidderId) -> Option<usize> {
        match &self.occupants {
            Some(occupants) => occupants.iter().position(|&id| id == bidder_id),
            None => self
                .bids
                .iter()
                .position(|&(id, _)| id == bidder_id)
                .filter(|&slot| slot < self.slot_payments.len()),
        }
    }

    /// Amount charged to the bidder in this round, 0 if it won no slot
    pub fn payment_of(&self, bidder_id: BidderId) -> f64 {
        self.slot_of(bidder_id)
            .and_then(|slot| self.slot_payments.get(slot).copied())
            .unwrap_or(0.0)
    }

    /// Clicks received by the bidder in this round, 0 if it won no slot
    pub fn clicks_of(&self, bidder_id: BidderId) -> f64 {
        self.slot_of(bidder_id)
            .and_then(|slot| self.clicks.get(slot).copied())
            .unwrap_or(0.0)
    }

    /// Bid submitted by the bidder in this round
    pub fn bid_of(&self, bidder_id: BidderId) -> Option<f64> {
        self.bids.iter().find(|&&(id, _)| id == bidder_id).map(|&(_, bid)| bid)
    }

    /// Clicks delivered over all slots
    pub fn total_clicks(&self) -> f64 {
        self.clicks.iter().sum()
    }
}

/// Append-only sequence of rounds
#[derive(Debug, Clone, Default)]
pub struct History {
    rounds: Vec<Round>,
}

impl History {
    pub fn new() -> Self {
        Self { rounds: Vec::new() }
    }

    /// Append a round and return its round number
    pub fn push(&mut self, round: Round) -> usize {
        self.rounds.push(round);
        self.rounds.len()
    }

    /// Round `t`, or None for t = 0 and rounds not played yet
    pub fn round(&self, t: usize) -> Option<&Round> {
        if t == 0 {
            return None;
        }
        self.rounds.get(t - 1)
    }

    /// Number of rounds played
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Rounds 1..t-1, i.e. everything observable before round t is bid
    pub fn rounds_before(&self, t: usize) -> &[Round] {
        let end = t.saturating_sub(1).min(self.rounds.len());
        &self.rounds[..end]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_round(occupants: Option<Vec<BidderId>>) -> Round {
        Round::new(
            vec![(2, 40.0), (0, 25.0), (1, 8.0)],
            vec![10.0, 6.0],
            vec![250.0, 60.0],
            occupants,
        )
    }

    #[test]
    fn test_round_zero_is_never_returned() {
        let mut history = History::new();
        assert!(history.round(0).is_none());
        assert!(history.round(1).is_none());

        let t = history.push(sample_round(None));
        assert_eq!(t, 1);
        assert!(history.round(0).is_none());
        assert!(history.round(1).is_some());
        assert!(history.round(2).is_none());
    }

    #[test]
    fn test_slot_from_bid_order_without_occupants() {
        let round = sample_round(None);
        assert_eq!(round.slot_of(2), Some(0));
        assert_eq!(round.slot_of(0), Some(1));
        // Third bidder has no slot (only two payments recorded)
        assert_eq!(round.slot_of(1), None);
        assert_eq!(round.payment_of(0), 60.0);
        assert_eq!(round.payment_of(1), 0.0);
        assert_eq!(round.clicks_of(2), 10.0);
    }

    #[test]
    fn test_slot_from_occupants() {
        let round = sample_round(Some(vec![0, 2]));
        assert_eq!(round.slot_of(0), Some(0));
        assert_eq!(round.payment_of(2), 60.0);
        assert_eq!(round.payment_of(7), 0.0);
    }

    #[test]
    fn test_rounds_before_excludes_current_round() {
        let mut history = History::new();
        history.push(sample_round(None));
        history.push(sample_round(None));
        assert_eq!(history.rounds_before(1).len(), 0);
        assert_eq!(history.rounds_before(2).len(), 1);
        assert_eq!(history.rounds_before(3).len(), 2);
        assert_eq!(history.rounds_before(10).len(), 2);
        assert_eq!(history.round(1).map(|r| r.total_clicks()), Some(16.0));
        assert_eq!(history.round(2).and_then(|r| r.bid_of(1)), Some(8.0));
    }
}
