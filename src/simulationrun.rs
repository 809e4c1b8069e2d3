/// This file contains the SimulationRun struct, which plays one simulated day of GSP auctions
/// (one auction per round) and the statistics collected from it.
///
/// The harness plays the part of the auction engine: it asks each bidder for a bid, zeroes bids of
/// bidders whose budget is gone, clears the round and caps each charge at what the occupant can
/// still pay. Every capped charge is counted, so a bidder that plans within its budget can be told
/// apart from one the harness had to rescue.

use rand::{rngs::StdRng, SeedableRng};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use crate::bidders::Bidders;
use crate::clicks::ClickCurve;
use crate::gsp;
use crate::history::{History, Round};
use crate::logger::{Logger, LogEvent, FileReceiver, sanitize_filename};
use crate::utils::{get_seed, TOTAL_SIMULATION_RUNS, VERBOSE_AUCTION};
use crate::{errln, logln, warnln};

/// Auction parameters shared by all rounds of a simulated day
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionSetup {
    pub num_slots: usize,
    pub num_rounds: usize,
    pub reserve: f64,
    pub click_curve: ClickCurve,
}

impl AuctionSetup {
    /// One day of 48 rounds with the default click curve
    pub fn new(num_slots: usize, reserve: f64) -> Self {
        let click_curve = ClickCurve::new();
        Self::new_advanced(num_slots, click_curve.rounds_per_day, reserve, click_curve)
    }

    pub fn new_advanced(num_slots: usize, num_rounds: usize, reserve: f64, click_curve: ClickCurve) -> Self {
        Self {
            num_slots,
            num_rounds,
            reserve,
            click_curve,
        }
    }
}

/// Marketplace containing the bidders and the auction they bid in
pub struct Marketplace {
    pub bidders: Bidders,
    pub setup: AuctionSetup,
}

impl Marketplace {
    pub fn new(bidders: Bidders, setup: AuctionSetup) -> Self {
        Self { bidders, setup }
    }

    /// Print initialization information about the marketplace
    pub fn printout(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Variant, "Initialized {} bidders, {} slots, {} rounds, reserve {:.2}",
            self.bidders.len(), self.setup.num_slots, self.setup.num_rounds, self.setup.reserve);
        for bidder in &self.bidders.bidders {
            logln!(logger, LogEvent::Variant, "  Bidder {} ({}) - {}: value {:.2}, budget {:.2}",
                bidder.bidder_id(), bidder.bidder_name(), bidder.bidder_type_string(), bidder.value(), bidder.budget());
        }
    }

    /// CSV header matching the Auction lines written by SimulationRun
    pub fn auction_csv_header(&self) -> String {
        let mut header_fields = vec![
            "round".to_string(),
            "reserve".to_string(),
            "total_clicks".to_string(),
        ];
        for bidder in &self.bidders.bidders {
            header_fields.push(format!("bidder_{}_bid", bidder.bidder_id()));
            header_fields.push(format!("bidder_{}_slot", bidder.bidder_id()));
            header_fields.push(format!("bidder_{}_payment", bidder.bidder_id()));
        }
        header_fields.join(",")
    }

    /// Run one simulated day with per-variant log files
    ///
    /// # Arguments
    /// * `variant_description` - Headline written to the variant log
    /// * `scenario_name` - Name of the scenario (for log file paths)
    /// * `variant_name` - Name of the variant (for log file paths)
    /// * `logger` - Logger for event-based logging
    ///
    /// # Returns
    /// The SimulationRun and its statistics
    pub fn run_variant(
        &mut self,
        variant_description: &str,
        scenario_name: &str,
        variant_name: &str,
        logger: &mut Logger,
    ) -> Result<(SimulationRun, SimulationStat), Box<dyn Error>> {
        if self.bidders.is_empty() {
            return Err(format!("{}: marketplace has no bidders", variant_name).into());
        }
        let scenario_dir = sanitize_filename(scenario_name);
        let variant_file = sanitize_filename(variant_name);

        let rounds_receiver_id = logger.add_receiver(FileReceiver::new(&PathBuf::from(format!("log/{}/rounds-{}.log", scenario_dir, variant_file)), vec![LogEvent::Round])?);
        let variant_receiver_id = logger.add_receiver(FileReceiver::new(&PathBuf::from(format!("log/{}/variant-{}.log", scenario_dir, variant_file)), vec![LogEvent::Variant])?);
        let auctions_receiver_id = if VERBOSE_AUCTION.load(Ordering::Relaxed) {
            let receiver_id = logger.add_receiver(FileReceiver::new(&PathBuf::from(format!("log/{}/auctions-{}.csv", scenario_dir, variant_file)), vec![LogEvent::Auction])?);
            let header = self.auction_csv_header();
            logln!(logger, LogEvent::Auction, "{}", header);
            Some(receiver_id)
        } else {
            None
        };

        logln!(logger, LogEvent::Variant, "\n=== {} ===", variant_description);
        self.printout(logger);

        let simulation_run = SimulationRun::new(self, logger);
        let stats = SimulationStat::new(self, &simulation_run);
        stats.printout(self, logger);
        if stats.overall_stat.total_clicks_sold == 0.0 {
            warnln!(logger, LogEvent::Variant, "{}: no clicks were sold during the whole day", variant_name);
        }

        if let Some(id) = auctions_receiver_id {
            logger.remove_receiver(id);
        }
        logger.remove_receiver(variant_receiver_id);
        logger.remove_receiver(rounds_receiver_id);

        Ok((simulation_run, stats))
    }
}

/// History of one simulated day plus what the engine charged each bidder
pub struct SimulationRun {
    pub history: History,
    /// Total charged per bidder, indexed by bidder_id
    pub charged: Vec<f64>,
    /// Rounds in which the bidder's charge had to be capped at its remaining budget
    pub capped_rounds: Vec<usize>,
}

impl SimulationRun {
    /// Play every round of the day
    pub fn new(marketplace: &mut Marketplace, logger: &mut Logger) -> Self {
        TOTAL_SIMULATION_RUNS.fetch_add(1, Ordering::Relaxed);
        let setup = marketplace.setup.clone();
        let budgets: Vec<f64> = marketplace.bidders.bidders.iter().map(|b| b.budget()).collect();
        let mut charged = vec![0.0; budgets.len()];
        let mut capped_rounds = vec![0; budgets.len()];
        let mut history = History::new();
        let mut rng_ties = StdRng::seed_from_u64(get_seed(5995));

        for t in 1..=setup.num_rounds {
            let clicks = setup.click_curve.slot_clicks(t, setup.num_slots);

            let mut bids = Vec::with_capacity(budgets.len());
            for bidder in marketplace.bidders.bidders.iter_mut() {
                let bidder_id = bidder.bidder_id();
                let mut bid = if t == 1 {
                    bidder.initial_bid(setup.reserve)
                } else {
                    bidder.bid(t, &history, setup.reserve, logger)
                };
                if !bid.is_finite() || bid < 0.0 {
                    errln!(logger, LogEvent::Round, "Invalid bid {:.4} from bidder {} in round {}, using 0", bid, bidder_id, t);
                    bid = 0.0;
                }
                if bid > bidder.value() {
                    errln!(logger, LogEvent::Round, "Bid {:.4} above value {:.4} from bidder {} in round {}", bid, bidder.value(), bidder_id, t);
                }
                if budgets[bidder_id] - charged[bidder_id] <= 0.0 {
                    bid = 0.0;
                }
                bids.push((bidder_id, bid));
            }

            let mut round = gsp::clear(&bids, &clicks, setup.reserve, &mut rng_ties);
            if let Some(occupants) = &round.occupants {
                for (slot, &bidder_id) in occupants.iter().enumerate() {
                    let affordable = (budgets[bidder_id] - charged[bidder_id]).max(0.0);
                    let payment = round.slot_payments[slot].min(affordable);
                    // Float noise in settled spend is not a real overcharge
                    if round.slot_payments[slot] - affordable > 1e-6 {
                        capped_rounds[bidder_id] += 1;
                        logln!(logger, LogEvent::Round, "Charge of bidder {} in round {} capped at remaining budget {:.2}", bidder_id, t, affordable);
                    }
                    round.slot_payments[slot] = payment;
                    charged[bidder_id] += payment;
                }
            }

            if VERBOSE_AUCTION.load(Ordering::Relaxed) && logger.is_enabled(LogEvent::Auction) {
                logln!(logger, LogEvent::Auction, "{}", Self::auction_csv_line(t, setup.reserve, &bids, &round));
            }
            history.push(round);
        }

        Self { history, charged, capped_rounds }
    }

    /// One CSV line per round: bid, slot (empty if none) and payment of every bidder
    fn auction_csv_line(t: usize, reserve: f64, bids: &[(usize, f64)], round: &Round) -> String {
        let mut csv_fields = vec![
            format!("{}", t),
            format!("{:.4}", reserve),
            format!("{:.0}", round.total_clicks()),
        ];
        for &(bidder_id, bid) in bids {
            csv_fields.push(format!("{:.4}", bid));
            match round.slot_of(bidder_id) {
                Some(slot) => csv_fields.push(format!("{}", slot)),
                None => csv_fields.push("".to_string()),
            }
            csv_fields.push(format!("{:.4}", round.payment_of(bidder_id)));
        }
        csv_fields.join(",")
    }
}

/// Statistics for a single bidder
#[derive(Debug, Clone, PartialEq)]
pub struct BidderStat {
    pub clicks: f64,
    pub spend: f64,
    /// value * clicks
    pub obtained_value: f64,
    /// obtained_value - spend
    pub utility: f64,
    pub rounds_won: usize,
    pub highest_bid: f64,
    pub rounds_bid_above_value: usize,
    /// First round after which nothing of the budget was left
    pub exhausted_round: Option<usize>,
    /// Rounds in which the charge was capped at the remaining budget
    pub capped_rounds: usize,
}

/// Overall statistics for the simulated day
#[derive(Debug, Clone, PartialEq)]
pub struct OverallStat {
    pub total_clicks_sold: f64,
    pub total_revenue: f64,
    pub total_utility: f64,
    pub unsold_slot_rounds: usize,
}

/// Complete simulation statistics
pub struct SimulationStat {
    pub bidder_stats: Vec<BidderStat>,
    pub overall_stat: OverallStat,
}

impl SimulationStat {
    /// Generate statistics from marketplace and simulation run
    pub fn new(marketplace: &Marketplace, simulation_run: &SimulationRun) -> Self {
        let mut bidder_stats: Vec<BidderStat> = marketplace
            .bidders
            .bidders
            .iter()
            .map(|bidder| BidderStat {
                clicks: 0.0,
                spend: 0.0,
                obtained_value: 0.0,
                utility: 0.0,
                rounds_won: 0,
                highest_bid: 0.0,
                rounds_bid_above_value: 0,
                exhausted_round: None,
                capped_rounds: simulation_run.capped_rounds.get(bidder.bidder_id()).copied().unwrap_or(0),
            })
            .collect();

        let mut overall_stat = OverallStat {
            total_clicks_sold: 0.0,
            total_revenue: 0.0,
            total_utility: 0.0,
            unsold_slot_rounds: 0,
        };

        for (index, round) in simulation_run.history.iter().enumerate() {
            let t = index + 1;
            for bidder in &marketplace.bidders.bidders {
                let bidder_id = bidder.bidder_id();
                let stat = &mut bidder_stats[bidder_id];
                let bid = round.bid_of(bidder_id).unwrap_or(0.0);
                stat.highest_bid = stat.highest_bid.max(bid);
                if bid > bidder.value() {
                    stat.rounds_bid_above_value += 1;
                }
                if round.slot_of(bidder_id).is_some() {
                    stat.rounds_won += 1;
                }
                let clicks = round.clicks_of(bidder_id);
                let payment = round.payment_of(bidder_id);
                stat.clicks += clicks;
                stat.spend += payment;
                stat.obtained_value += clicks * bidder.value();
                if stat.exhausted_round.is_none() && bidder.budget() > 0.0 && stat.spend >= bidder.budget() - 1e-9 {
                    stat.exhausted_round = Some(t);
                }
            }
            let occupied = round.occupants.as_ref().map_or(0, |occupants| occupants.len());
            overall_stat.unsold_slot_rounds += round.num_slots().saturating_sub(occupied);
        }

        for stat in &mut bidder_stats {
            stat.utility = stat.obtained_value - stat.spend;
            overall_stat.total_clicks_sold += stat.clicks;
            overall_stat.total_revenue += stat.spend;
            overall_stat.total_utility += stat.utility;
        }

        Self {
            bidder_stats,
            overall_stat,
        }
    }

    /// Output bidder statistics
    pub fn printout_bidders(&self, marketplace: &Marketplace, logger: &mut Logger, event: LogEvent) {
        for (index, stat) in self.bidder_stats.iter().enumerate() {
            let bidder = &marketplace.bidders.bidders[index];
            logln!(logger, event, "\nBidder {} ({}) - {}", bidder.bidder_id(), bidder.bidder_name(), bidder.bidder_type_string());
            logln!(logger, event, "  Clicks: {:.0} in {} rounds won", stat.clicks, stat.rounds_won);
            logln!(logger, event, "  Spend / budget: {:.2} / {:.2}", stat.spend, bidder.budget());
            let value_per_spend = if stat.spend > 0.0 {
                stat.obtained_value / stat.spend
            } else {
                0.0
            };
            logln!(logger, event, "  Obtained value: {:.2} (per spend: {:.4}), utility: {:.2}", stat.obtained_value, value_per_spend, stat.utility);
            match stat.exhausted_round {
                Some(t) => logln!(logger, event, "  Budget exhausted in round {}", t),
                None => logln!(logger, event, "  Budget lasted the whole day"),
            }
            if stat.capped_rounds > 0 {
                logln!(logger, event, "  Charge capped at remaining budget in {} rounds", stat.capped_rounds);
            }
        }
    }

    /// Output only overall statistics
    pub fn printout_overall(&self, logger: &mut Logger) {
        logln!(logger, LogEvent::Variant, "\n=== Overall Statistics ===");
        logln!(logger, LogEvent::Variant, "Clicks sold: {:.0}, unsold slot-rounds: {}", self.overall_stat.total_clicks_sold, self.overall_stat.unsold_slot_rounds);
        logln!(logger, LogEvent::Variant, "Total revenue: {:.2}", self.overall_stat.total_revenue);
        logln!(logger, LogEvent::Variant, "Total bidder utility: {:.2}", self.overall_stat.total_utility);
    }

    /// Output complete statistics
    pub fn printout(&self, marketplace: &Marketplace, logger: &mut Logger) {
        logln!(logger, LogEvent::Variant, "\n=== Bidder Statistics ===");
        self.printout_bidders(marketplace, logger, LogEvent::Variant);
        self.printout_overall(logger);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidders::BidderType;

    fn marketplace(budget: f64) -> Marketplace {
        let mut bidders = Bidders::new();
        bidders.add("Truthful 60".to_string(), BidderType::TRUTHFUL, 60.0, budget);
        bidders.add("Truthful 40".to_string(), BidderType::TRUTHFUL, 40.0, budget);
        bidders.add("HHAW".to_string(), BidderType::HHAW_BUDGET, 50.0, budget);
        bidders.add("SCTW".to_string(), BidderType::SCTW_BUDGET, 45.0, budget);
        Marketplace::new(bidders, AuctionSetup::new(3, 10.0))
    }

    #[test]
    fn test_day_has_every_round() {
        let mut marketplace = marketplace(100000.0);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        assert_eq!(run.history.len(), 48);
        assert!(run.history.round(48).is_some());
        assert_eq!(run.history.round(1).map(|r| r.num_slots()), Some(3));
    }

    #[test]
    fn test_short_day_with_custom_curve() {
        let mut bidders = Bidders::new();
        bidders.add("Truthful".to_string(), BidderType::TRUTHFUL, 30.0, 1.0e6);
        bidders.add("Balanced".to_string(), BidderType::BALANCED, 25.0, 1.0e6);
        let curve = ClickCurve::new_advanced(20.0, 0.0, 10, 0.5);
        let mut marketplace = Marketplace::new(bidders, AuctionSetup::new_advanced(2, 10, 1.0, curve));
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        assert_eq!(run.history.len(), 10);
        let round = run.history.round(10).map(|r| r.clicks.clone());
        assert_eq!(round, Some(vec![20.0, 10.0]));
    }

    #[test]
    fn test_charges_never_exceed_budget() {
        let mut marketplace = marketplace(2000.0);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        for (bidder_id, charged) in run.charged.iter().enumerate() {
            assert!(*charged <= 2000.0 + 1e-9, "bidder {} charged {}", bidder_id, charged);
        }
        let stats = SimulationStat::new(&marketplace, &run);
        for (bidder_id, stat) in stats.bidder_stats.iter().enumerate() {
            assert!((stat.spend - run.charged[bidder_id]).abs() < 1e-6);
            assert_eq!(stat.capped_rounds, run.capped_rounds[bidder_id]);
        }
        // Budget bidders plan within what is left, the truthful 60 overruns and gets capped
        assert_eq!(stats.bidder_stats[2].capped_rounds, 0);
        assert_eq!(stats.bidder_stats[3].capped_rounds, 0);
        assert!(stats.bidder_stats[0].capped_rounds >= 1);
    }

    #[test]
    fn test_run_variant_needs_bidders() {
        let mut marketplace = Marketplace::new(Bidders::new(), AuctionSetup::new(2, 1.0));
        let mut logger = Logger::new();
        assert!(marketplace.run_variant("Empty", "test_empty", "empty", &mut logger).is_err());
    }

    #[test]
    fn test_bids_never_exceed_value() {
        let mut marketplace = marketplace(5000.0);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        let stats = SimulationStat::new(&marketplace, &run);
        for stat in &stats.bidder_stats {
            assert_eq!(stat.rounds_bid_above_value, 0);
        }
    }

    #[test]
    fn test_budget_bidders_bid_at_least_reserve_while_funded() {
        let mut marketplace = marketplace(1.0e7);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        for round in run.history.iter() {
            for bidder_id in [2, 3] {
                let bid = round.bid_of(bidder_id).unwrap_or(0.0);
                assert!(bid >= 10.0, "bid {} below reserve", bid);
            }
        }
    }

    #[test]
    fn test_statistics_add_up() {
        let mut marketplace = marketplace(1.0e7);
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        let stats = SimulationStat::new(&marketplace, &run);
        let total_spend: f64 = stats.bidder_stats.iter().map(|s| s.spend).sum();
        assert!((stats.overall_stat.total_revenue - total_spend).abs() < 1e-6);
        // Four bidders above the reserve always fill three slots
        assert_eq!(stats.overall_stat.unsold_slot_rounds, 0);
        let delivered: f64 = run.history.iter().map(|r| r.total_clicks()).sum();
        assert!((stats.overall_stat.total_clicks_sold - delivered).abs() < 1e-6);
    }

    #[test]
    fn test_zero_budget_bidder_never_wins() {
        let mut bidders = Bidders::new();
        bidders.add("Broke".to_string(), BidderType::HHAW_BUDGET, 80.0, 0.0);
        bidders.add("Truthful".to_string(), BidderType::TRUTHFUL, 30.0, 100000.0);
        let mut marketplace = Marketplace::new(bidders, AuctionSetup::new(2, 5.0));
        let mut logger = Logger::new();
        let run = SimulationRun::new(&mut marketplace, &mut logger);
        let stats = SimulationStat::new(&marketplace, &run);
        assert_eq!(stats.bidder_stats[0].rounds_won, 0);
        assert_eq!(stats.bidder_stats[0].highest_bid, 0.0);
        assert_eq!(stats.bidder_stats[1].rounds_won, 48);
    }
}
