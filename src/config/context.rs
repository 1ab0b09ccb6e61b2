use super::UserConfig;

/// Read-only flattened view of a resolved [`UserConfig`].
///
/// Indicator, detector, and risk code consume these scalars instead of
/// walking the nested record. Constructed once per request, never shared
/// across requests.
#[derive(Debug, Clone, Copy)]
pub struct ConfigContext {
    // indicator lookbacks
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub adx_period: usize,
    pub atr_period: usize,

    // detector thresholds
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub rsi_extreme_oversold: f64,
    pub rsi_extreme_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
    pub large_move_pct: f64,
    pub gap_pct: f64,

    // risk qualifier
    pub stop_atr_swing: f64,
    pub stop_atr_day: f64,
    pub stop_atr_scalp: f64,
    pub stop_min_atr_multiple: f64,
    pub stop_max_atr_multiple: f64,
    pub min_rr_ratio: f64,
    pub preferred_rr_ratio: f64,
    pub volatility_low: f64,
    pub volatility_high: f64,
    pub adx_trending: f64,
    pub adx_no_trend: f64,
    pub signal_conflict_pct: f64,
    pub swing_lookback: usize,
    pub option_min_expected_move: f64,
    pub call_delta_min: f64,
    pub call_delta_max: f64,
    pub put_delta_min: f64,
    pub put_delta_max: f64,
    pub option_swing_min_dte: u32,
    pub option_swing_max_dte: u32,
    pub option_spread_width_atr: f64,

    // bias aggregation
    pub momentum_top_k: usize,
    pub momentum_weight_strong: f64,
    pub momentum_weight_moderate: f64,

    // output shaping
    pub max_signals_returned: usize,
    pub max_trade_plans: usize,
}

impl ConfigContext {
    pub fn from_config(cfg: &UserConfig) -> Self {
        Self {
            rsi_period: cfg.indicators.rsi_period,
            macd_fast: cfg.indicators.macd_fast,
            macd_slow: cfg.indicators.macd_slow,
            macd_signal: cfg.indicators.macd_signal,
            bollinger_period: cfg.indicators.bollinger_period,
            bollinger_std_dev: cfg.indicators.bollinger_std_dev,
            stoch_k_period: cfg.indicators.stoch_k_period,
            stoch_d_period: cfg.indicators.stoch_d_period,
            adx_period: cfg.indicators.adx_period,
            atr_period: cfg.indicators.atr_period,
            rsi_oversold: cfg.indicators.rsi_oversold,
            rsi_overbought: cfg.indicators.rsi_overbought,
            rsi_extreme_oversold: cfg.indicators.rsi_extreme_oversold,
            rsi_extreme_overbought: cfg.indicators.rsi_extreme_overbought,
            stoch_oversold: cfg.indicators.stoch_oversold,
            stoch_overbought: cfg.indicators.stoch_overbought,
            large_move_pct: cfg.indicators.large_move_pct,
            gap_pct: cfg.indicators.gap_pct,
            stop_atr_swing: cfg.risk.stop_atr_swing,
            stop_atr_day: cfg.risk.stop_atr_day,
            stop_atr_scalp: cfg.risk.stop_atr_scalp,
            stop_min_atr_multiple: cfg.risk.stop_min_atr_multiple,
            stop_max_atr_multiple: cfg.risk.stop_max_atr_multiple,
            min_rr_ratio: cfg.risk.min_rr_ratio,
            preferred_rr_ratio: cfg.risk.preferred_rr_ratio,
            volatility_low: cfg.risk.volatility_low,
            volatility_high: cfg.risk.volatility_high,
            adx_trending: cfg.risk.adx_trending,
            adx_no_trend: cfg.risk.adx_no_trend,
            signal_conflict_pct: cfg.risk.signal_conflict_pct,
            swing_lookback: cfg.risk.swing_lookback,
            option_min_expected_move: cfg.risk.option_min_expected_move,
            call_delta_min: cfg.risk.call_delta_min,
            call_delta_max: cfg.risk.call_delta_max,
            put_delta_min: cfg.risk.put_delta_min,
            put_delta_max: cfg.risk.put_delta_max,
            option_swing_min_dte: cfg.risk.option_swing_min_dte,
            option_swing_max_dte: cfg.risk.option_swing_max_dte,
            option_spread_width_atr: cfg.risk.option_spread_width_atr,
            momentum_top_k: cfg.momentum.top_k,
            momentum_weight_strong: cfg.momentum.weight_strong,
            momentum_weight_moderate: cfg.momentum.weight_moderate,
            max_signals_returned: cfg.signals.max_signals_returned,
            max_trade_plans: cfg.signals.max_trade_plans,
        }
    }
}
