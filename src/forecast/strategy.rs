/// A projection model over an ordered history of values.
///
/// Implementations receive at least one observation and return exactly
/// `periods` point estimates.
pub trait ForecastStrategy {
    fn name(&self) -> &'static str;

    fn project(&self, history: &[f64], periods: usize) -> Vec<f64>;
}

/// Trailing moving average, held flat across the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverage {
    pub window: usize,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Mean of the last `min(window, len)` values; 0 for an empty history.
    pub fn level(&self, history: &[f64]) -> f64 {
        let take = self.window.max(1).min(history.len());
        if take == 0 {
            return 0.0;
        }
        let tail = &history[history.len() - take..];
        tail.iter().sum::<f64>() / take as f64
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ForecastStrategy for MovingAverage {
    fn name(&self) -> &'static str {
        "moving_average"
    }

    fn project(&self, history: &[f64], periods: usize) -> Vec<f64> {
        vec![self.level(history); periods]
    }
}
