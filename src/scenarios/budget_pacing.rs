/// A bidder with a tight budget competes against three well funded truthful bidders.
///
/// Its two variants run the same bidder with and without budget pacing:
///
/// - Variant A: Balanced bidding with no pacing, held back only by the per-round budget ceiling
///
/// - Variant B: Budget balanced bidding with hhaw pacing, which spreads the budget over the day
///
/// Neither variant may rely on the harness capping a charge at the remaining budget.

use crate::bidders::{BidderType, Bidders};
use crate::simulationrun::{AuctionSetup, Marketplace, SimulationStat};
use crate::scenarios::Validations;
use crate::logger::{Logger, LogEvent};
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "budget_pacing",
    run,
});

const PACED_BIDDER_BUDGET: f64 = 3000.0;

/// Bidder 0 is the one under test
fn prepare_marketplace(bidder_type: BidderType) -> Marketplace {
    let mut bidders = Bidders::new();
    bidders.add("Tight budget".to_string(), bidder_type, 40.0, PACED_BIDDER_BUDGET);
    bidders.add("Truthful 30".to_string(), BidderType::TRUTHFUL, 30.0, 1.0e7);
    bidders.add("Truthful 25".to_string(), BidderType::TRUTHFUL, 25.0, 1.0e7);
    bidders.add("Truthful 20".to_string(), BidderType::TRUTHFUL, 20.0, 1.0e7);
    Marketplace::new(bidders, AuctionSetup::new(3, 1.0))
}

fn validate(stats_unpaced: &SimulationStat, stats_paced: &SimulationStat, logger: &mut Logger) -> Validations {
    let mut validations = Validations::new();
    let unpaced = &stats_unpaced.bidder_stats[0];
    let paced = &stats_paced.bidder_stats[0];

    validations.check(
        paced.spend <= PACED_BIDDER_BUDGET + 1e-6 && unpaced.spend <= PACED_BIDDER_BUDGET + 1e-6,
        format!("Spend stays within budget: {:.2} / {:.2} <= {:.2}", unpaced.spend, paced.spend, PACED_BIDDER_BUDGET),
        logger,
    );
    validations.check(
        paced.capped_rounds == 0 && unpaced.capped_rounds == 0,
        format!("No charge capped at remaining budget: {} / {} rounds", unpaced.capped_rounds, paced.capped_rounds),
        logger,
    );
    validations.check(
        paced.rounds_bid_above_value == 0 && unpaced.rounds_bid_above_value == 0,
        format!("No bid above value: {} / {} rounds", unpaced.rounds_bid_above_value, paced.rounds_bid_above_value),
        logger,
    );
    let unpaced_exhausted = unpaced.exhausted_round.unwrap_or(usize::MAX);
    let paced_exhausted = paced.exhausted_round.unwrap_or(usize::MAX);
    validations.check(
        paced_exhausted >= unpaced_exhausted,
        format!("Paced budget lasts at least as long as unpaced: {:?} >= {:?}", paced.exhausted_round, unpaced.exhausted_round),
        logger,
    );
    validations
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let mut marketplace_a = prepare_marketplace(BidderType::BALANCED);
    let (_, stats_a) = marketplace_a.run_variant("Running balanced bidding without pacing", scenario_name, "unpaced", logger)?;

    let mut marketplace_b = prepare_marketplace(BidderType::HHAW_BUDGET);
    let (_, stats_b) = marketplace_b.run_variant("Running budget balanced bidding with hhaw pacing", scenario_name, "hhaw", logger)?;

    logln!(logger, LogEvent::Scenario, "");
    logln!(logger, LogEvent::Scenario, "Clicks won: unpaced {:.0}, paced {:.0}", stats_a.bidder_stats[0].clicks, stats_b.bidder_stats[0].clicks);

    validate(&stats_a, &stats_b, logger).into_result(scenario_name)
}
