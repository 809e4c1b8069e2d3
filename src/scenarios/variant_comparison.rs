/// Five bidders with log-normally distributed values and equal budgets, all using the same strategy.
///
/// Its five variants differ only in the strategy:
///
/// - Variant A: Truthful bidding
///
/// - Variant B: Balanced bidding without pacing
///
/// - Variant C: Budget balanced bidding, hhaw flavour
///
/// - Variant D: Budget balanced bidding, sctw flavour
///
/// - Variant E: Budget balanced bidding, hhaw pacing with a click doubling top slot bid and
///   value banded first round bids
///
/// Every variant must keep bids at or below value and spend within budget. All variants except
/// truthful bidding must get there on their own, without the harness capping a charge. Revenue
/// and bidder utility are reported side by side.

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::Distribution;
use crate::bidder_config::{BidderConfig, InitialBid, TopSlotBid};
use crate::bidders::{BidderType, Bidders};
use crate::simulationrun::{AuctionSetup, Marketplace, SimulationStat};
use crate::scenarios::Validations;
use crate::logger::{Logger, LogEvent};
use crate::utils;
use crate::logln;

inventory::submit!(crate::scenarios::ScenarioEntry {
    short_name: "variant_comparison",
    run,
});

const NUM_BIDDERS: usize = 5;
const BUDGET: f64 = 4000.0;

/// hhaw pacing with the alternative top slot and first round rules
fn custom_config() -> BidderConfig {
    BidderConfig {
        top_slot_bid: TopSlotBid::ClickDoubling,
        initial_bid: InitialBid::Bands(vec![(15.0, 0.6), (30.0, 0.5), (f64::INFINITY, 0.4)]),
        ..BidderConfig::hhaw()
    }
}

/// Values are drawn from the same seed for every variant
fn prepare_marketplace(bidder_type: BidderType) -> Marketplace {
    let mut rng = StdRng::seed_from_u64(utils::get_seed(101));
    let value_dist = utils::lognormal_dist(20.0, 8.0);
    let mut bidders = Bidders::new();
    for index in 0..NUM_BIDDERS {
        let value = value_dist.sample(&mut rng);
        bidders.add(format!("Bidder {}", index), bidder_type.clone(), value, BUDGET);
    }
    Marketplace::new(bidders, AuctionSetup::new(3, 2.0))
}

/// `plans_within_budget` marks strategies that must never need a capped charge
fn validate(variant_name: &str, plans_within_budget: bool, marketplace: &Marketplace, stats: &SimulationStat, validations: &mut Validations, logger: &mut Logger) {
    let overspent = stats
        .bidder_stats
        .iter()
        .zip(marketplace.bidders.bidders.iter())
        .filter(|(stat, bidder)| stat.spend > bidder.budget() + 1e-6)
        .count();
    validations.check(
        overspent == 0,
        format!("{}: no bidder spends above budget ({} overspent)", variant_name, overspent),
        logger,
    );
    if plans_within_budget {
        let capped: usize = stats.bidder_stats.iter().map(|s| s.capped_rounds).sum();
        validations.check(
            capped == 0,
            format!("{}: no charge capped at remaining budget ({} rounds)", variant_name, capped),
            logger,
        );
    }
    let above_value: usize = stats.bidder_stats.iter().map(|s| s.rounds_bid_above_value).sum();
    validations.check(
        above_value == 0,
        format!("{}: no bid above value ({} rounds)", variant_name, above_value),
        logger,
    );
}

pub fn run(scenario_name: &str, logger: &mut Logger) -> Result<(), Box<dyn std::error::Error>> {
    let variants = [
        ("Running truthful bidding", "truthful", BidderType::TRUTHFUL),
        ("Running balanced bidding without pacing", "balanced", BidderType::BALANCED),
        ("Running budget balanced bidding (hhaw)", "hhaw", BidderType::HHAW_BUDGET),
        ("Running budget balanced bidding (sctw)", "sctw", BidderType::SCTW_BUDGET),
        ("Running budget balanced bidding (custom)", "custom", BidderType::CUSTOM { config: custom_config() }),
    ];

    let mut validations = Validations::new();
    let mut summary = Vec::with_capacity(variants.len());
    for (description, variant_name, bidder_type) in variants {
        let plans_within_budget = !matches!(bidder_type, BidderType::TRUTHFUL);
        let mut marketplace = prepare_marketplace(bidder_type);
        let (_, stats) = marketplace.run_variant(description, scenario_name, variant_name, logger)?;
        validate(variant_name, plans_within_budget, &marketplace, &stats, &mut validations, logger);
        summary.push((variant_name, stats.overall_stat));
    }

    logln!(logger, LogEvent::Scenario, "");
    for (variant_name, overall) in &summary {
        logln!(logger, LogEvent::Scenario, "{:>9}: revenue {:>9.2}, bidder utility {:>9.2}, clicks sold {:>6.0}",
            variant_name, overall.total_revenue, overall.total_utility, overall.total_clicks_sold);
    }

    validations.into_result(scenario_name)
}
