//! Directional movement: ADX, +DI, −DI.

use super::Column;
use crate::data::Bar;

pub struct AdxColumns {
    pub adx: Column,
    pub plus_di: Column,
    pub minus_di: Column,
}

/// Wilder's directional movement system.
///
/// +DI/−DI are defined from position `period`; ADX needs a further `period`
/// of DX values and is defined from position `2 * period - 1`.
pub fn adx(bars: &[Bar], period: usize) -> AdxColumns {
    let n = bars.len();
    let mut adx_col: Column = vec![None; n];
    let mut plus_di_col: Column = vec![None; n];
    let mut minus_di_col: Column = vec![None; n];

    if period == 0 || n < period + 1 {
        return AdxColumns {
            adx: adx_col,
            plus_di: plus_di_col,
            minus_di: minus_di_col,
        };
    }

    let mut plus_dm = Vec::with_capacity(n - 1);
    let mut minus_dm = Vec::with_capacity(n - 1);
    let mut true_range = Vec::with_capacity(n - 1);
    for i in 1..n {
        let up_move = bars[i].high - bars[i - 1].high;
        let down_move = bars[i - 1].low - bars[i].low;
        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });
        let prev_close = bars[i - 1].close;
        true_range.push(
            (bars[i].high - bars[i].low)
                .max((bars[i].high - prev_close).abs())
                .max((bars[i].low - prev_close).abs()),
        );
    }

    // Wilder smoothing of the three movement series
    let mut smoothed_plus: f64 = plus_dm[..period].iter().sum();
    let mut smoothed_minus: f64 = minus_dm[..period].iter().sum();
    let mut smoothed_tr: f64 = true_range[..period].iter().sum();

    let mut dx_values: Vec<f64> = Vec::with_capacity(n);
    let mut write_di = |bar_idx: usize,
                        plus: f64,
                        minus: f64,
                        tr: f64,
                        plus_col: &mut Column,
                        minus_col: &mut Column,
                        dx_values: &mut Vec<f64>| {
        if tr <= 0.0 {
            return;
        }
        let plus_di = plus / tr * 100.0;
        let minus_di = minus / tr * 100.0;
        plus_col[bar_idx] = Some(plus_di);
        minus_col[bar_idx] = Some(minus_di);
        let di_sum = plus_di + minus_di;
        if di_sum > 0.0 {
            dx_values.push((plus_di - minus_di).abs() / di_sum * 100.0);
        } else {
            dx_values.push(0.0);
        }
    };

    write_di(
        period,
        smoothed_plus,
        smoothed_minus,
        smoothed_tr,
        &mut plus_di_col,
        &mut minus_di_col,
        &mut dx_values,
    );

    for i in period..plus_dm.len() {
        smoothed_plus = smoothed_plus - smoothed_plus / period as f64 + plus_dm[i];
        smoothed_minus = smoothed_minus - smoothed_minus / period as f64 + minus_dm[i];
        smoothed_tr = smoothed_tr - smoothed_tr / period as f64 + true_range[i];
        write_di(
            i + 1,
            smoothed_plus,
            smoothed_minus,
            smoothed_tr,
            &mut plus_di_col,
            &mut minus_di_col,
            &mut dx_values,
        );
    }

    // ADX = Wilder-smoothed DX
    if dx_values.len() >= period {
        let mut adx_value: f64 = dx_values[..period].iter().sum::<f64>() / period as f64;
        adx_col[2 * period - 1] = Some(adx_value);
        for i in period..dx_values.len() {
            adx_value = (adx_value * (period - 1) as f64 + dx_values[i]) / period as f64;
            adx_col[period + i] = Some(adx_value);
        }
    }

    AdxColumns {
        adx: adx_col,
        plus_di: plus_di_col,
        minus_di: minus_di_col,
    }
}
