use crate::clicks::ClickCurve;

/// Bid used when the utility-maximizing slot is the top slot
/// There is no slot above the top one, so the indifference equation needs a convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TopSlotBid {
    /// Bid the full private value
    Value,
    /// Pretend the slot above the top has twice the top clicks, which yields (value + min_bid) / 2
    ClickDoubling,
}

/// First-round bid, used when there is no history yet
#[derive(Debug, Clone, PartialEq)]
pub enum InitialBid {
    /// Fixed fraction of the value
    Fraction(f64),
    /// (upper value bound, fraction) bands in increasing order of bound
    /// The first band whose bound is above the value applies, the last band covers everything else
    Bands(Vec<(f64, f64)>),
}

impl InitialBid {
    pub fn fraction_for(&self, value: f64) -> f64 {
        match self {
            InitialBid::Fraction(fraction) => *fraction,
            InitialBid::Bands(bands) => bands
                .iter()
                .find(|(upper, _)| value < *upper)
                .or_else(|| bands.last())
                .map(|(_, fraction)| *fraction)
                .unwrap_or(0.5),
        }
    }
}

/// Parameters of the budgeted balanced-bidding heuristic
///
/// The bidding drafts differ only in these constants, so each draft is a preset
/// (`hhaw`, `sctw`) rather than its own bidder type.
#[derive(Debug, Clone, PartialEq)]
pub struct BidderConfig {
    pub click_curve: ClickCurve,
    /// Rounds in the campaign, used for the click schedule and the participation guard
    pub total_rounds: usize,
    /// Two consecutive competitor bids closer than this are averaged
    pub noise_threshold: f64,
    pub top_slot_bid: TopSlotBid,
    pub initial_bid: InitialBid,
    /// Scale bids down when spend runs ahead of the click schedule
    pub budget_pacing: bool,
    /// Exponent applied to the spend/schedule ratio, higher reacts harder
    pub budget_sensitivity: f64,
    /// Spent budget fraction at which the budget factor drops to 0
    pub exhaustion_fraction: f64,
    /// Number of defaulted competitors that drops the budget factor to 0, 0 disables
    pub default_threshold: usize,
    /// Exponent damping the seasonality ratio, 0 disables seasonality
    pub seasonality_exponent: f64,
    /// Keep enough budget to bid the reserve in every remaining round
    pub participation_guard: bool,
    /// Rounds strictly between these bounds target one slot lower
    pub low_traffic_rounds: Option<(usize, usize)>,
    /// Minimal bid is this much above the reserve
    pub floor_increment: f64,
}

impl BidderConfig {
    /// Budgeted balanced bidder with click-schedule pacing and default detection
    pub fn hhaw() -> Self {
        Self {
            click_curve: ClickCurve::new(),
            total_rounds: 48,
            noise_threshold: 2.0,
            top_slot_bid: TopSlotBid::Value,
            initial_bid: InitialBid::Fraction(0.5),
            budget_pacing: true,
            budget_sensitivity: 1.0,
            exhaustion_fraction: 0.98,
            default_threshold: 2,
            seasonality_exponent: 1.0 / 3.0,
            participation_guard: false,
            low_traffic_rounds: None,
            floor_increment: 0.01,
        }
    }

    /// Budgeted balanced bidder that guards participation and retreats during the click trough
    pub fn sctw() -> Self {
        Self {
            budget_sensitivity: 2.0,
            default_threshold: 0,
            participation_guard: true,
            low_traffic_rounds: Some((22, 26)),
            ..Self::hhaw()
        }
    }

    /// Plain balanced bidding: no pacing, no seasonality
    pub fn unpaced() -> Self {
        Self {
            budget_pacing: false,
            default_threshold: 0,
            seasonality_exponent: 0.0,
            ..Self::hhaw()
        }
    }

    /// True if round `t` falls in the configured low traffic window
    pub fn is_low_traffic(&self, t: usize) -> bool {
        match self.low_traffic_rounds {
            Some((low, high)) => t > low && t < high,
            None => false,
        }
    }

    pub fn description(&self) -> String {
        let top = match self.top_slot_bid {
            TopSlotBid::Value => "top=value",
            TopSlotBid::ClickDoubling => "top=click-doubling",
        };
        let pacing = if self.budget_pacing {
            format!("pacing^{:.1}", self.budget_sensitivity)
        } else {
            "no pacing".to_string()
        };
        format!(
            "{}, {}, season^{:.2}{}{}",
            top,
            pacing,
            self.seasonality_exponent,
            if self.participation_guard { ", guard" } else { "" },
            if self.low_traffic_rounds.is_some() { ", trough retreat" } else { "" }
        )
    }
}

impl Default for BidderConfig {
    fn default() -> Self {
        Self::hhaw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_differ_only_where_documented() {
        let hhaw = BidderConfig::hhaw();
        let sctw = BidderConfig::sctw();
        assert_eq!(hhaw.click_curve, sctw.click_curve);
        assert_eq!(hhaw.noise_threshold, sctw.noise_threshold);
        assert!(!hhaw.participation_guard);
        assert!(sctw.participation_guard);
        assert_eq!(hhaw.default_threshold, 2);
        assert_eq!(sctw.default_threshold, 0);

        let unpaced = BidderConfig::unpaced();
        assert!(!unpaced.budget_pacing);
        assert_eq!(unpaced.seasonality_exponent, 0.0);
    }

    #[test]
    fn test_low_traffic_window_is_exclusive() {
        let config = BidderConfig::sctw();
        assert!(!config.is_low_traffic(22));
        assert!(config.is_low_traffic(23));
        assert!(config.is_low_traffic(25));
        assert!(!config.is_low_traffic(26));
        assert!(!BidderConfig::hhaw().is_low_traffic(24));
    }

    #[test]
    fn test_initial_bid_bands() {
        let bands = InitialBid::Bands(vec![(50.0, 0.75), (100.0, 0.5), (f64::INFINITY, 0.4)]);
        assert_eq!(bands.fraction_for(20.0), 0.75);
        assert_eq!(bands.fraction_for(50.0), 0.5);
        assert_eq!(bands.fraction_for(500.0), 0.4);
        assert_eq!(InitialBid::Bands(vec![(10.0, 0.9)]).fraction_for(20.0), 0.9);
        assert_eq!(InitialBid::Bands(Vec::new()).fraction_for(20.0), 0.5);
        assert_eq!(InitialBid::Fraction(0.5).fraction_for(20.0), 0.5);
    }
}
