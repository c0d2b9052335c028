//! Bounded random walk
//!
//! Every model in the plant advances its gauges through [`step`]: a uniform
//! perturbation, a clamp into the gauge range and rounding to display
//! precision.

use rand::Rng;

/// Decimal places kept on walked values
pub const PRECISION: i32 = 2;

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Round to the display precision used by the walks.
pub fn round2(value: f64) -> f64 {
    round_to(value, PRECISION)
}

/// Advance `current` by a uniform draw from `[-volatility, +volatility]`,
/// clamp into `[min, max]` and round to two decimals.
///
/// `min` must not exceed `max`.
pub fn step<R: Rng + ?Sized>(
    rng: &mut R,
    current: f64,
    min: f64,
    max: f64,
    volatility: f64,
) -> f64 {
    let volatility = volatility.abs();
    let change = if volatility > 0.0 {
        rng.gen_range(-volatility..=volatility)
    } else {
        0.0
    };
    round2((current + change).clamp(min, max))
}
