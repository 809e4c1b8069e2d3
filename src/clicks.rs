use std::f64::consts::PI;

/// Diurnal click-volume model
///
/// Top slot clicks follow a cosine over one day: `mean + amplitude * cos(2π (t-1) / rounds_per_day)`,
/// rounded to whole clicks. Slot j receives the top slot clicks scaled by `slot_decay^j`, so
/// clicks never increase with the slot index.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickCurve {
    pub mean: f64,
    pub amplitude: f64,
    pub rounds_per_day: usize,
    pub slot_decay: f64,
}

impl ClickCurve {
    /// Default curve: 48 rounds per day, top slot between 20 and 80 clicks, 25% fewer clicks per slot down
    pub fn new() -> Self {
        Self::new_advanced(50.0, 30.0, 48, 0.75)
    }

    /// # Arguments
    /// * `mean` - Average top slot clicks over a day
    /// * `amplitude` - Peak deviation from the mean
    /// * `rounds_per_day` - Period of the curve in rounds
    /// * `slot_decay` - Click ratio between consecutive slots (0..=1)
    pub fn new_advanced(mean: f64, amplitude: f64, rounds_per_day: usize, slot_decay: f64) -> Self {
        Self {
            mean,
            amplitude,
            rounds_per_day: rounds_per_day.max(1),
            slot_decay: slot_decay.clamp(0.0, 1.0),
        }
    }

    /// Clicks of the top slot in round `t` (rounds numbered from 1)
    pub fn top_slot_clicks(&self, t: usize) -> f64 {
        let phase = 2.0 * PI * t.saturating_sub(1) as f64 / self.rounds_per_day as f64;
        (self.mean + self.amplitude * phase.cos()).round().max(0.0)
    }

    /// Clicks of every slot in round `t`, top slot first
    pub fn slot_clicks(&self, t: usize, num_slots: usize) -> Vec<f64> {
        let top = self.top_slot_clicks(t);
        (0..num_slots)
            .map(|slot| (top * self.slot_decay.powi(slot as i32)).round())
            .collect()
    }

    /// Clicks over all slots in round `t`
    pub fn total_clicks(&self, t: usize, num_slots: usize) -> f64 {
        self.slot_clicks(t, num_slots).iter().sum()
    }

    /// Clicks over all slots in rounds 1..=rounds
    pub fn clicks_through(&self, rounds: usize, num_slots: usize) -> f64 {
        (1..=rounds).map(|t| self.total_clicks(t, num_slots)).sum()
    }

    /// Average clicks per round over one full day
    pub fn average_clicks_per_round(&self, num_slots: usize) -> f64 {
        self.clicks_through(self.rounds_per_day, num_slots) / self.rounds_per_day as f64
    }
}

impl Default for ClickCurve {
    fn default() -> Self {
        Self::new()
    }
}
