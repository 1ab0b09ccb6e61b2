//! Market structure: swing-point detection for invalidation and target
//! levels.

use crate::data::Bar;

/// Bars required on each side of a local extremum.
pub const SWING_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwingPoint {
    pub index: usize,
    pub price: f64,
}

/// Swing lows inside the trailing `lookback` bars, oldest to newest. A swing
/// low is a strict minimum against `SWING_WINDOW` bars on each side, so the
/// final `SWING_WINDOW` bars can never qualify.
pub fn swing_lows(bars: &[Bar], lookback: usize) -> Vec<SwingPoint> {
    swing_points(bars, lookback, |b| b.low, |candidate, other| candidate < other)
}

/// Swing highs inside the trailing `lookback` bars, oldest to newest.
pub fn swing_highs(bars: &[Bar], lookback: usize) -> Vec<SwingPoint> {
    swing_points(bars, lookback, |b| b.high, |candidate, other| candidate > other)
}

fn swing_points(
    bars: &[Bar],
    lookback: usize,
    price_of: impl Fn(&Bar) -> f64,
    beats: impl Fn(f64, f64) -> bool,
) -> Vec<SwingPoint> {
    let n = bars.len();
    if n < 2 * SWING_WINDOW + 1 {
        return Vec::new();
    }
    let start = n.saturating_sub(lookback).max(SWING_WINDOW);
    let end = n - SWING_WINDOW;

    let mut points = Vec::new();
    for i in start..end {
        let candidate = price_of(&bars[i]);
        let is_extremum = (i - SWING_WINDOW..i)
            .chain(i + 1..=i + SWING_WINDOW)
            .all(|j| beats(candidate, price_of(&bars[j])));
        if is_extremum {
            points.push(SwingPoint {
                index: i,
                price: candidate,
            });
        }
    }
    points
}

/// The most recent swing low strictly below `reference`.
pub fn nearest_low_below(bars: &[Bar], lookback: usize, reference: f64) -> Option<SwingPoint> {
    swing_lows(bars, lookback)
        .into_iter()
        .rev()
        .find(|p| p.price < reference)
}

/// The most recent swing high strictly above `reference`.
pub fn nearest_high_above(bars: &[Bar], lookback: usize, reference: f64) -> Option<SwingPoint> {
    swing_highs(bars, lookback)
        .into_iter()
        .rev()
        .find(|p| p.price > reference)
}
