/// Edge cases around budgets and the reserve.
///
/// A single variant runs a market with:
///
/// - a budget bidder with no budget at all, which must never bid
///
/// - a budget bidder whose value is below the reserve, which must never bid
///
/// - a budget bidder with a small budget, which must never need its charge capped to stay within it
///
/// - two well funded truthful bidders filling the slots

use crate::bidders::{BidderType, Bidders};
use crate::simulationrun::{AuctionSetup, Marketplace, SimulationStat};
use crate::scenarios::Validations;
use crate::logger::Logger;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "exhausted_budget",
    run,
});

const RESERVE: f64 = 5.0;
const SMALL_BUDGET: f64 = 1500.0;

const BROKE: usize = 0;
const UNPROFITABLE: usize = 1;
const SMALL: usize = 2;

fn prepare_marketplace() -> Marketplace {
    let mut bidders = Bidders::new();
    bidders.add("Broke".to_string(), BidderType::HHAW_BUDGET, 50.0, 0.0);
    bidders.add("Below reserve".to_string(), BidderType::SCTW_BUDGET, 4.0, 1000.0);
    bidders.add("Small budget".to_string(), BidderType::SCTW_BUDGET, 30.0, SMALL_BUDGET);
    bidders.add("Truthful 20".to_string(), BidderType::TRUTHFUL, 20.0, 1.0e7);
    bidders.add("Truthful 15".to_string(), BidderType::TRUTHFUL, 15.0, 1.0e7);
    Marketplace::new(bidders, AuctionSetup::new(2, RESERVE))
}

fn validate(stats: &SimulationStat, logger: &mut Logger) -> Validations {
    let mut validations = Validations::new();
    let broke = &stats.bidder_stats[BROKE];
    let unprofitable = &stats.bidder_stats[UNPROFITABLE];
    let small = &stats.bidder_stats[SMALL];

    validations.check(
        broke.highest_bid == 0.0 && broke.rounds_won == 0,
        format!("Bidder without budget never bids: highest bid {:.2}, rounds won {}", broke.highest_bid, broke.rounds_won),
        logger,
    );
    validations.check(
        unprofitable.highest_bid == 0.0 && unprofitable.spend == 0.0,
        format!("Bidder valuing clicks below reserve never bids: highest bid {:.2}, spend {:.2}", unprofitable.highest_bid, unprofitable.spend),
        logger,
    );
    validations.check(
        small.spend <= SMALL_BUDGET + 1e-6,
        format!("Small budget is never overspent: {:.2} <= {:.2}", small.spend, SMALL_BUDGET),
        logger,
    );
    validations.check(
        small.capped_rounds == 0,
        format!("Small budget bidder never needs a capped charge: {} rounds", small.capped_rounds),
        logger,
    );
    let above_value: usize = stats.bidder_stats.iter().map(|s| s.rounds_bid_above_value).sum();
    validations.check(
        above_value == 0,
        format!("No bid above value: {} rounds", above_value),
        logger,
    );
    validations
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut marketplace = prepare_marketplace();
    let (_, stats) = marketplace.run_variant("Running budget edge cases", scenario_name, "edge-cases", logger)?;
    validate(&stats, logger).into_result(scenario_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulationrun::SimulationRun;

    #[test]
    fn test_budget_edge_cases_hold() {
        let mut logger = Logger::new();
        let mut marketplace = prepare_marketplace();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        let stats = SimulationStat::new(&marketplace, &run);
        assert!(validate(&stats, &mut logger).errors().is_empty());
        assert!(stats.bidder_stats[SMALL].clicks > 0.0);
    }
}
