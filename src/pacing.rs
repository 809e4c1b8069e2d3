use crate::bidder_config::BidderConfig;
use crate::clicks::ClickCurve;

/// Budget conservation factor in [0, 1]
///
/// # Arguments
/// * `spent_fraction` - Share of the budget already spent
/// * `elapsed_click_fraction` - Share of the campaign's clicks already delivered
/// * `defaulted_competitors` - Competitors that are out of the auction
/// * `config` - Pacing parameters
///
/// Stays at 1 while spend follows the click schedule and falls below 1 once spend runs ahead of it.
/// Drops to 0 when the budget is nearly gone or enough competitors defaulted, in which case
/// the bid ends up at the reserve floor.
pub fn budget_factor(spent_fraction: f64, elapsed_click_fraction: f64, defaulted_competitors: usize, config: &BidderConfig) -> f64 {
    if !config.budget_pacing {
        return 1.0;
    }
    if spent_fraction >= config.exhaustion_fraction {
        return 0.0;
    }
    if config.default_threshold > 0 && defaulted_competitors >= config.default_threshold {
        return 0.0;
    }
    let remaining_clicks = 1.0 - elapsed_click_fraction;
    if remaining_clicks <= 0.0 {
        return 1.0;
    }
    let remaining_spend = (1.0 - spent_fraction).max(0.0);
    (remaining_spend / remaining_clicks).powf(config.budget_sensitivity).min(1.0)
}

/// Ratio of this round's clicks to the daily average, damped by `exponent`
pub fn seasonality_factor(curve: &ClickCurve, t: usize, num_slots: usize, exponent: f64) -> f64 {
    if exponent == 0.0 {
        return 1.0;
    }
    let average = curve.average_clicks_per_round(num_slots);
    if average <= 0.0 {
        return 1.0;
    }
    (curve.total_clicks(t, num_slots) / average).powf(exponent)
}

/// Lowest bid worth submitting: just above the reserve, never above the value
pub fn bid_floor(reserve: f64, value: f64, floor_increment: f64) -> f64 {
    (reserve + floor_increment).min(value)
}

/// Highest bid the remaining budget can carry in one round
///
/// The budget is shared evenly over the rounds still to play, and paying the bid for every
/// click of the busiest slot (`max_clicks`) must still fit in what is left.
pub fn budget_cap(remaining_budget: f64, rounds_left: usize, max_clicks: f64) -> f64 {
    if remaining_budget <= 0.0 {
        return 0.0;
    }
    let per_round = remaining_budget / rounds_left.max(1) as f64;
    per_round.min(affordable_per_click(remaining_budget, max_clicks))
}

/// Remaining budget expressed per click of the busiest slot
pub fn affordable_per_click(remaining_budget: f64, max_clicks: f64) -> f64 {
    if max_clicks > 0.0 {
        remaining_budget / max_clicks
    } else {
        remaining_budget
    }
}

/// Make a bid legal for the auction
///
/// Never above the value. Below the floor the floor is used as long as `affordable`
/// (remaining budget per click) can pay it, otherwise we return 0 and sit the round out.
/// With the reserve at or above the value no slot can be profitable, so we bid 0 as well.
pub fn clamp_and_finalize(bid: f64, reserve: f64, value: f64, affordable: f64, floor_increment: f64) -> f64 {
    if reserve >= value || affordable <= 0.0 {
        return 0.0;
    }
    let floor = bid_floor(reserve, value, floor_increment);
    if bid >= floor {
        return bid.min(value);
    }
    if affordable >= floor {
        floor
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_schedule_spend_keeps_full_bid() {
        let config = BidderConfig::hhaw();
        assert_eq!(budget_factor(0.0, 0.0, 0, &config), 1.0);
        assert_eq!(budget_factor(0.4, 0.5, 0, &config), 1.0);
        assert_eq!(budget_factor(0.5, 0.5, 0, &config), 1.0);
    }

    #[test]
    fn test_overspend_lowers_factor() {
        let config = BidderConfig::hhaw();
        let factor = budget_factor(0.7, 0.4, 0, &config);
        assert!((factor - 0.5).abs() < 1e-9);

        // Sensitivity 2 reacts harder
        let factor_sctw = budget_factor(0.7, 0.4, 0, &BidderConfig::sctw());
        assert!((factor_sctw - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_factor_is_non_increasing_in_spend() {
        let config = BidderConfig::hhaw();
        for elapsed in [0.0, 0.25, 0.5, 0.9, 1.0] {
            let mut previous = f64::INFINITY;
            for step in 0..=100 {
                let spent = step as f64 / 100.0;
                let factor = budget_factor(spent, elapsed, 0, &config);
                assert!(factor <= previous, "spent {} elapsed {}", spent, elapsed);
                assert!((0.0..=1.0).contains(&factor));
                previous = factor;
            }
        }
    }

    #[test]
    fn test_exhausted_budget_gives_zero() {
        let config = BidderConfig::hhaw();
        assert_eq!(budget_factor(1.0, 0.2, 0, &config), 0.0);
        assert_eq!(budget_factor(0.99, 0.99, 0, &config), 0.0);
    }

    #[test]
    fn test_defaulted_competitors_drop_factor() {
        let config = BidderConfig::hhaw();
        assert_eq!(budget_factor(0.1, 0.5, 2, &config), 0.0);
        assert_eq!(budget_factor(0.1, 0.5, 1, &config), 1.0);
        // Disabled for sctw
        assert_eq!(budget_factor(0.1, 0.5, 5, &BidderConfig::sctw()), 1.0);
    }

    #[test]
    fn test_unpaced_ignores_budget() {
        assert_eq!(budget_factor(1.0, 0.0, 9, &BidderConfig::unpaced()), 1.0);
    }

    #[test]
    fn test_seasonality_peak_and_trough() {
        let curve = ClickCurve::new();
        let peak = seasonality_factor(&curve, 1, 3, 1.0 / 3.0);
        let trough = seasonality_factor(&curve, 25, 3, 1.0 / 3.0);
        assert!(peak > 1.0 && peak < 1.2, "peak {}", peak);
        assert!(trough < 1.0 && trough > 0.7, "trough {}", trough);
        assert_eq!(seasonality_factor(&curve, 25, 3, 0.0), 1.0);
        assert_eq!(seasonality_factor(&curve, 25, 0, 1.0 / 3.0), 1.0);
    }

    #[test]
    fn test_budget_cap_spreads_and_fits_busiest_slot() {
        // 970 over 47 rounds is 20.6 per round, but 80 clicks at most pay 12.125 each
        assert!((budget_cap(970.0, 47, 80.0) - 12.125).abs() < 1e-9);
        // Few clicks left: the per-round share binds
        assert!((budget_cap(970.0, 47, 10.0) - 970.0 / 47.0).abs() < 1e-9);
        // Last round may use the whole per-click budget
        assert!((budget_cap(100.0, 1, 0.0) - 100.0).abs() < 1e-9);
        assert_eq!(budget_cap(0.0, 10, 80.0), 0.0);
        assert_eq!(budget_cap(-5.0, 10, 80.0), 0.0);
        // Zero rounds left is treated as the last round
        assert_eq!(budget_cap(50.0, 0, 0.0), 50.0);
        assert_eq!(affordable_per_click(40.0, 80.0), 0.5);
    }

    #[test]
    fn test_clamp_never_above_value() {
        assert_eq!(clamp_and_finalize(140.0, 10.0, 100.0, 500.0, 0.01), 100.0);
        assert_eq!(clamp_and_finalize(60.0, 10.0, 100.0, 500.0, 0.01), 60.0);
    }

    #[test]
    fn test_clamp_raises_low_bid_to_floor() {
        assert_eq!(clamp_and_finalize(0.0, 10.0, 100.0, 500.0, 0.01), 10.01);
        assert_eq!(clamp_and_finalize(9.0, 10.0, 10.005, 500.0, 0.01), 10.005);
    }

    #[test]
    fn test_clamp_declines_when_broke_or_unprofitable() {
        assert_eq!(clamp_and_finalize(50.0, 10.0, 100.0, 0.0, 0.01), 0.0);
        assert_eq!(clamp_and_finalize(5.0, 10.0, 100.0, 5.0, 0.01), 0.0);
        assert_eq!(clamp_and_finalize(50.0, 100.0, 100.0, 500.0, 0.01), 0.0);
    }
}
