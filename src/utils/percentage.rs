use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    /// Builds a percentage of `value` out of `whole`, clamped into [0, 100]. An empty whole gives 0%.
    pub fn of_clamped(value: f64, whole: f64) -> Percentage {
        if whole <= 0. || value.is_nan() {
            return Percentage(0.);
        }
        Percentage((value / whole * 100.).clamp(0., 100.))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
