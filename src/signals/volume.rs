//! Volume signals: spikes, dry-ups, OBV direction.

use super::{last_two, Signal, SignalCategory, SignalStrength};
use crate::indicators::{col, IndicatorFrame};

const SPIKE_RATIO: f64 = 2.0;
const EXTREME_RATIO: f64 = 3.0;
const DRY_UP_RATIO: f64 = 0.5;
const OBV_SLOPE_BARS: usize = 5;

pub fn detect(frame: &IndicatorFrame) -> Vec<Signal> {
    let mut out = Vec::new();
    if frame.is_empty() {
        return out;
    }
    let last = frame.len() - 1;
    let volume = frame.series().last_bar().volume as f64;

    if let Some(avg) = frame.at(col::VOLUME_SMA_20, last) {
        if avg > 0.0 {
            let ratio = volume / avg;
            if ratio >= EXTREME_RATIO {
                out.push(Signal::new(
                    "Extreme Volume Spike",
                    format!("Volume {ratio:.1}x the 20-day average"),
                    SignalStrength::Significant,
                    SignalCategory::Volume,
                    Some(ratio),
                ));
            } else if ratio >= SPIKE_RATIO {
                out.push(Signal::new(
                    "Volume Spike",
                    format!("Volume {ratio:.1}x the 20-day average"),
                    SignalStrength::Notable,
                    SignalCategory::Volume,
                    Some(ratio),
                ));
            } else if ratio <= DRY_UP_RATIO {
                out.push(Signal::new(
                    "Volume Dry-Up",
                    format!("Volume {ratio:.1}x the 20-day average"),
                    SignalStrength::Neutral,
                    SignalCategory::Volume,
                    Some(ratio),
                ));
            }
        }
    }

    // OBV direction over the last few bars confirms participation
    if let Some((_, last_idx)) = last_two(frame) {
        if last_idx + 1 >= OBV_SLOPE_BARS {
            let earlier = last_idx + 1 - OBV_SLOPE_BARS;
            if let (Some(obv_then), Some(obv_now)) =
                (frame.at(col::OBV, earlier), frame.at(col::OBV, last_idx))
            {
                let closes = frame.series().closes();
                let price_up = closes[last_idx] > closes[earlier];
                if obv_now > obv_then && price_up {
                    out.push(Signal::new(
                        "OBV Confirming Advance",
                        "On-balance volume rising with price",
                        SignalStrength::Bullish,
                        SignalCategory::Volume,
                        Some(obv_now),
                    ));
                }
                if obv_now < obv_then && !price_up {
                    out.push(Signal::new(
                        "OBV Confirming Decline",
                        "On-balance volume falling with price",
                        SignalStrength::Bearish,
                        SignalCategory::Volume,
                        Some(obv_now),
                    ));
                }
            }
        }
    }

    out
}
