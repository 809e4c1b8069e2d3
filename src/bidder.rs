use crate::bidder_config::BidderConfig;
use crate::estimator::{estimate_competitor_bids, CompetitorLedger};
use crate::history::{BidderId, History, Round};
use crate::logger::{Logger, LogEvent};
use crate::logln;
use crate::pacing::{affordable_per_click, bid_floor, budget_cap, budget_factor, clamp_and_finalize, seasonality_factor};
use crate::slots::{choose_target_slot, compute_balanced_bid, expected_utilities, quote_slot, quote_slots, SlotQuote};

/// Trait for bidders taking part in the GSP auction
pub trait BidderTrait {
    fn bidder_id(&self) -> BidderId;

    fn bidder_name(&self) -> &str;

    /// Private per-click value
    fn value(&self) -> f64;

    /// Initial budget for the whole campaign
    fn budget(&self) -> f64;

    /// Spend observed by the bidder itself so far
    fn spent(&self) -> f64;

    fn remaining_budget(&self) -> f64 {
        self.budget() - self.spent()
    }

    /// Bid for the first round, when there is no history
    fn initial_bid(&self, reserve: f64) -> f64;

    /// Bid for round `t` given rounds 1..t-1 in `history`
    fn bid(&mut self, t: usize, history: &History, reserve: f64, logger: &mut Logger) -> f64;

    /// Get a string representation of the bidding type
    fn bidder_type_string(&self) -> String;
}

/// Own spend, settled from round payments exactly once per round
#[derive(Debug, Clone, Default)]
pub struct SpendCounter {
    spent: f64,
    settled_through: usize,
}

impl SpendCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spent(&self) -> f64 {
        self.spent
    }

    /// Settle every round before `t` that was not settled yet
    /// Returns the newly settled rounds
    pub fn settle<'a>(&mut self, bidder_id: BidderId, t: usize, history: &'a History) -> &'a [Round] {
        let observable = history.rounds_before(t);
        if observable.len() <= self.settled_through {
            return &[];
        }
        let fresh = &observable[self.settled_through..];
        for round in fresh {
            self.spent += round.payment_of(bidder_id);
        }
        self.settled_through = observable.len();
        fresh
    }
}

/// Budgeted balanced bidder
///
/// Each round it predicts the competitors' bids, picks the slot with the best
/// clicks * (value - price) tradeoff, computes the balanced bid for that slot and
/// scales it by a budget pacing factor and a seasonality factor before clamping it
/// to [reserve floor, value].
pub struct BudgetBidder {
    pub bidder_id: BidderId,
    pub bidder_name: String,
    pub value: f64,
    pub budget: f64,
    pub config: BidderConfig,
    spend: SpendCounter,
    competitors: CompetitorLedger,
}

impl BudgetBidder {
    pub fn new(bidder_id: BidderId, bidder_name: String, value: f64, budget: f64, config: BidderConfig) -> Self {
        Self {
            bidder_id,
            bidder_name,
            value,
            budget,
            config,
            spend: SpendCounter::new(),
            competitors: CompetitorLedger::new(),
        }
    }

    /// Observe own and competitor payments of all rounds before `t`
    fn settle(&mut self, t: usize, history: &History) {
        let fresh = self.spend.settle(self.bidder_id, t, history);
        for round in fresh {
            self.competitors.charge(self.bidder_id, round);
        }
    }

    /// Predicted competitor bids for round `t`, None in the first round
    pub fn predicted_bids(&self, t: usize, history: &History) -> Option<Vec<(BidderId, f64)>> {
        let previous = history.round(t.checked_sub(1)?)?;
        let two_rounds_ago = t.checked_sub(2).and_then(|older| history.round(older));
        Some(estimate_competitor_bids(self.bidder_id, previous, two_rounds_ago, self.config.noise_threshold))
    }

    /// Quotes for every slot of the previous round, empty in the first round
    pub fn slot_quotes(&self, t: usize, history: &History, reserve: f64) -> Vec<SlotQuote> {
        match (self.predicted_bids(t, history), history.round(t.saturating_sub(1))) {
            (Some(predicted), Some(previous)) => quote_slots(&previous.clicks, reserve, &predicted),
            _ => Vec::new(),
        }
    }

    /// Expected utility of winning each slot at its minimum bid
    pub fn expected_utils(&self, t: usize, history: &History, reserve: f64) -> Vec<f64> {
        let quotes = self.slot_quotes(t, history, reserve);
        match history.round(t.saturating_sub(1)) {
            Some(previous) => expected_utilities(self.value, &previous.clicks, &quotes),
            None => Vec::new(),
        }
    }

    /// Slot to aim for in round `t`, including the low traffic retreat
    pub fn target_slot(&self, t: usize, history: &History, reserve: f64) -> Option<SlotQuote> {
        let quotes = self.slot_quotes(t, history, reserve);
        let utilities = self.expected_utils(t, history, reserve);
        let target = choose_target_slot(&utilities)?;
        if !self.config.is_low_traffic(t) {
            return quotes.get(target).copied();
        }
        // Deliberately one slot down the page (fewer clicks, cheaper), not up, priced at that slot's own minimum bid
        let previous = history.round(t.saturating_sub(1))?;
        let predicted = self.predicted_bids(t, history)?;
        let lower = (target + 1).min(quotes.len() - 1);
        quote_slot(lower, &previous.clicks, reserve, &predicted)
    }

    /// Budget ceiling for a bid in round `t`, see `pacing::budget_cap`
    pub fn budget_ceiling(&self, t: usize) -> f64 {
        let rounds_left = (self.config.total_rounds + 1).saturating_sub(t);
        budget_cap(self.remaining_budget(), rounds_left, self.max_clicks(t))
    }

    /// Remaining budget per click of the busiest slot in round `t`
    fn affordable(&self, t: usize) -> f64 {
        affordable_per_click(self.remaining_budget(), self.max_clicks(t))
    }

    fn max_clicks(&self, t: usize) -> f64 {
        self.config.click_curve.top_slot_clicks(t)
    }

    fn spent_fraction(&self) -> f64 {
        if self.budget <= 0.0 {
            1.0
        } else {
            self.spend.spent() / self.budget
        }
    }

    /// Share of the campaign's clicks delivered before round `t`
    fn elapsed_click_fraction(&self, t: usize, history: &History, num_slots: usize) -> f64 {
        let campaign_clicks = self.config.click_curve.clicks_through(self.config.total_rounds, num_slots);
        if campaign_clicks <= 0.0 {
            return 1.0;
        }
        let past_clicks: f64 = history.rounds_before(t).iter().map(|round| round.total_clicks()).sum();
        past_clicks / campaign_clicks
    }

    /// (budget factor, seasonality factor) for round `t`
    fn pacing_factors(&self, t: usize, history: &History, num_slots: usize, predicted: &[(BidderId, f64)]) -> (f64, f64) {
        let defaulted = self.competitors.defaulted_count(predicted, self.budget);
        let budget = budget_factor(
            self.spent_fraction(),
            self.elapsed_click_fraction(t, history, num_slots),
            defaulted,
            &self.config,
        );
        let season = seasonality_factor(&self.config.click_curve, t, num_slots, self.config.seasonality_exponent);
        (budget, season)
    }

    /// Scale a raw bid by budget pacing and seasonality, apply the participation guard and
    /// cap the result at what the remaining budget can carry
    pub fn apply_budget_and_seasonality(&self, raw_bid: f64, t: usize, history: &History, reserve: f64, predicted: &[(BidderId, f64)]) -> f64 {
        let num_slots = history.round(t.saturating_sub(1)).map_or(0, |round| round.num_slots());
        let (budget, season) = self.pacing_factors(t, history, num_slots, predicted);
        let mut bid = raw_bid * budget * season;
        if self.config.participation_guard {
            let rounds_left = self.config.total_rounds.saturating_sub(t) as f64;
            if self.remaining_budget() - bid < reserve * rounds_left {
                bid = bid_floor(reserve, self.value, self.config.floor_increment);
            }
        }
        bid.min(self.budget_ceiling(t))
    }
}

impl BidderTrait for BudgetBidder {
    fn bidder_id(&self) -> BidderId {
        self.bidder_id
    }

    fn bidder_name(&self) -> &str {
        &self.bidder_name
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn budget(&self) -> f64 {
        self.budget
    }

    fn spent(&self) -> f64 {
        self.spend.spent()
    }

    fn initial_bid(&self, reserve: f64) -> f64 {
        let bid = (self.value * self.config.initial_bid.fraction_for(self.value)).min(self.budget_ceiling(1));
        clamp_and_finalize(bid, reserve, self.value, self.affordable(1), self.config.floor_increment)
    }

    fn bid(&mut self, t: usize, history: &History, reserve: f64, logger: &mut Logger) -> f64 {
        let predicted = match self.predicted_bids(t, history) {
            Some(predicted) => predicted,
            None => return self.initial_bid(reserve),
        };
        self.settle(t, history);

        let remaining = self.remaining_budget();
        let affordable = self.affordable(t);
        let quote = match self.target_slot(t, history, reserve) {
            Some(quote) => quote,
            None => {
                // No slots on offer, nothing to balance against
                return clamp_and_finalize(0.0, reserve, self.value, affordable, self.config.floor_increment);
            }
        };
        let clicks = history.round(t - 1).map(|round| round.clicks.as_slice()).unwrap_or(&[]);
        let raw_bid = compute_balanced_bid(self.value, &quote, clicks, self.config.top_slot_bid);
        let paced_bid = self.apply_budget_and_seasonality(raw_bid, t, history, reserve, &predicted);
        let bid = clamp_and_finalize(paced_bid, reserve, self.value, affordable, self.config.floor_increment);

        logln!(logger, LogEvent::Round,
            "t={} {} target={} min={:.2} raw={:.2} paced={:.2} bid={:.2} remaining={:.2}",
            t, self.bidder_name, quote.slot, quote.min_bid, raw_bid, paced_bid, bid, remaining);
        bid
    }

    fn bidder_type_string(&self) -> String {
        format!("Budget balanced ({})", self.config.description())
    }
}

/// Bids its value every round until its budget is gone
pub struct TruthfulBidder {
    pub bidder_id: BidderId,
    pub bidder_name: String,
    pub value: f64,
    pub budget: f64,
    spend: SpendCounter,
}

impl TruthfulBidder {
    pub fn new(bidder_id: BidderId, bidder_name: String, value: f64, budget: f64) -> Self {
        Self {
            bidder_id,
            bidder_name,
            value,
            budget,
            spend: SpendCounter::new(),
        }
    }

    fn truthful_bid(&self, reserve: f64) -> f64 {
        if self.remaining_budget() <= 0.0 || self.value < reserve {
            0.0
        } else {
            self.value
        }
    }
}

impl BidderTrait for TruthfulBidder {
    fn bidder_id(&self) -> BidderId {
        self.bidder_id
    }

    fn bidder_name(&self) -> &str {
        &self.bidder_name
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn budget(&self) -> f64 {
        self.budget
    }

    fn spent(&self) -> f64 {
        self.spend.spent()
    }

    fn initial_bid(&self, reserve: f64) -> f64 {
        self.truthful_bid(reserve)
    }

    fn bid(&mut self, t: usize, history: &History, reserve: f64, _logger: &mut Logger) -> f64 {
        self.spend.settle(self.bidder_id, t, history);
        self.truthful_bid(reserve)
    }

    fn bidder_type_string(&self) -> String {
        "Truthful".to_string()
    }
}
