use crate::bidder::{BidderTrait, BudgetBidder, TruthfulBidder};
use crate::bidder_config::BidderConfig;
use crate::history::BidderId;

/// Bidding strategy of a bidder added through Bidders::add
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, PartialEq)]
pub enum BidderType {
    TRUTHFUL,
    /// Balanced bidding without budget pacing
    BALANCED,
    HHAW_BUDGET,
    SCTW_BUDGET,
    CUSTOM { config: BidderConfig },
}

/// Container for bidders
/// The bidder ID always matches the index in the Vec
pub struct Bidders {
    pub bidders: Vec<Box<dyn BidderTrait>>,
}

impl Bidders {
    pub fn new() -> Self {
        Self {
            bidders: Vec::new(),
        }
    }

    /// Add a bidder to the collection
    ///
    /// # Arguments
    /// * `bidder_name` - Name used in logs and charts
    /// * `bidder_type` - Bidding strategy
    /// * `value` - Private per-click value
    /// * `budget` - Budget for the whole campaign
    ///
    /// # Returns
    /// The bidder_id of the just added bidder
    pub fn add(&mut self, bidder_name: String, bidder_type: BidderType, value: f64, budget: f64) -> BidderId {
        self.add_advanced(|bidder_id| {
            let config = match bidder_type {
                BidderType::TRUTHFUL => {
                    return Box::new(TruthfulBidder::new(bidder_id, bidder_name, value, budget));
                }
                BidderType::BALANCED => BidderConfig::unpaced(),
                BidderType::HHAW_BUDGET => BidderConfig::hhaw(),
                BidderType::SCTW_BUDGET => BidderConfig::sctw(),
                BidderType::CUSTOM { config } => config,
            };
            Box::new(BudgetBidder::new(bidder_id, bidder_name, value, budget, config))
        })
    }

    /// Add a bidder built by `make`, which receives the bidder_id to use
    ///
    /// # Returns
    /// The bidder_id of the just added bidder
    pub fn add_advanced<F>(&mut self, make: F) -> BidderId
    where
        F: FnOnce(BidderId) -> Box<dyn BidderTrait>,
    {
        let bidder_id = self.bidders.len();
        let bidder = make(bidder_id);
        assert_eq!(bidder.bidder_id(), bidder_id, "Bidder must use the bidder_id it was given");
        self.bidders.push(bidder);
        bidder_id
    }

    pub fn len(&self) -> usize {
        self.bidders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bidders.is_empty()
    }
}

impl Default for Bidders {
    fn default() -> Self {
        Self::new()
    }
}
