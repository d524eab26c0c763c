//! Live-bet projection: how much of the target is left, how fast the player
//! has to produce it, and how likely that looks.
//!
//! `derive_metrics` is the pure core:
//!   - `remaining = max(target - current, 0)`
//!   - `pace = remaining / minutes_left` (infinite when time is up and the
//!     target is not reached, zero when nothing is left)
//!   - `completion = current / target * 100`, not capped at 100

use crate::api::types::LiveBetRecord;
use crate::config::LiveConfig;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MetricsError {
    #[error("target must be positive, got {0}")]
    NonPositiveTarget(f64),
    #[error("remaining minutes must be non-negative, got {0}")]
    NegativeMinutes(f64),
    #[error("current value must be finite, got {0}")]
    NonFiniteValue(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveMetrics {
    pub remaining_value: f64,
    pub required_pace_per_minute: f64,
    pub completion_percentage: f64,
}

pub fn derive_metrics(
    current_value: f64,
    target: f64,
    remaining_minutes: f64,
) -> Result<LiveMetrics, MetricsError> {
    // `!(x > 0)` also rejects NaN.
    if !(target > 0.0) || !target.is_finite() {
        return Err(MetricsError::NonPositiveTarget(target));
    }
    if !(remaining_minutes >= 0.0) || !remaining_minutes.is_finite() {
        return Err(MetricsError::NegativeMinutes(remaining_minutes));
    }
    if !current_value.is_finite() {
        return Err(MetricsError::NonFiniteValue(current_value));
    }

    let remaining_value = (target - current_value).max(0.0);
    let required_pace_per_minute = if remaining_minutes > 0.0 {
        remaining_value / remaining_minutes
    } else if remaining_value > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    Ok(LiveMetrics {
        remaining_value,
        required_pace_per_minute,
        completion_percentage: current_value / target * 100.0,
    })
}

/// Probability tier shown on each live bet card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveStatus {
    TargetReached,
    VeryLikely,
    Likely,
    Possible,
    AtRisk,
    TargetMissed,
    /// A label the server sent that is not one of the known tiers.
    Other(String),
}

impl LiveStatus {
    pub fn label(&self) -> &str {
        match self {
            LiveStatus::TargetReached => "Meta Alcançada",
            LiveStatus::VeryLikely => "Muito Provável",
            LiveStatus::Likely => "Provável",
            LiveStatus::Possible => "Possível",
            LiveStatus::AtRisk => "Risco",
            LiveStatus::TargetMissed => "Meta Não Alcançada",
            LiveStatus::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Self {
        match label {
            "Meta Alcançada" => LiveStatus::TargetReached,
            "Muito Provável" => LiveStatus::VeryLikely,
            "Provável" => LiveStatus::Likely,
            "Possível" => LiveStatus::Possible,
            "Risco" => LiveStatus::AtRisk,
            "Meta Não Alcançada" => LiveStatus::TargetMissed,
            other => LiveStatus::Other(other.to_string()),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, LiveStatus::TargetReached | LiveStatus::TargetMissed)
    }
}

/// Cutoffs for the local fallback classifier. Ratios compare the pace still
/// required against the pace the player has shown so far.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusThresholds {
    pub regulation_minutes: f64,
    pub very_likely_ratio: f64,
    pub likely_ratio: f64,
    pub possible_ratio: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self::from(&LiveConfig::default())
    }
}

impl From<&LiveConfig> for StatusThresholds {
    fn from(cfg: &LiveConfig) -> Self {
        Self {
            regulation_minutes: cfg.regulation_minutes,
            very_likely_ratio: cfg.very_likely_ratio,
            likely_ratio: cfg.likely_ratio,
            possible_ratio: cfg.possible_ratio,
        }
    }
}

/// Local tier assignment, used only when the server sends no label.
pub fn classify(
    metrics: &LiveMetrics,
    current_value: f64,
    target: f64,
    remaining_minutes: f64,
    thresholds: &StatusThresholds,
) -> LiveStatus {
    if metrics.completion_percentage >= 100.0 {
        return LiveStatus::TargetReached;
    }
    if remaining_minutes <= 0.0 {
        return LiveStatus::TargetMissed;
    }

    let elapsed = thresholds.regulation_minutes - remaining_minutes;
    let reference_pace = if elapsed > 0.0 {
        current_value / elapsed
    } else {
        // Nothing played yet: measure against an even spread of the target.
        target / thresholds.regulation_minutes.max(1.0)
    };

    let ratio = if reference_pace > 0.0 {
        metrics.required_pace_per_minute / reference_pace
    } else {
        f64::INFINITY
    };

    if ratio <= thresholds.very_likely_ratio {
        LiveStatus::VeryLikely
    } else if ratio <= thresholds.likely_ratio {
        LiveStatus::Likely
    } else if ratio <= thresholds.possible_ratio {
        LiveStatus::Possible
    } else {
        LiveStatus::AtRisk
    }
}

/// A live bet ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveBetView {
    pub bet: LiveBetRecord,
    pub metrics: LiveMetrics,
    pub status: LiveStatus,
    pub status_from_server: bool,
    pub potential_profit: f64,
}

pub fn project(bet: LiveBetRecord, thresholds: &StatusThresholds) -> Result<LiveBetView, MetricsError> {
    let metrics = derive_metrics(bet.current_value, bet.target, bet.remaining_minutes)?;

    let server_status = bet
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(LiveStatus::from_label);
    let status_from_server = server_status.is_some();
    let status = server_status.unwrap_or_else(|| {
        classify(
            &metrics,
            bet.current_value,
            bet.target,
            bet.remaining_minutes,
            thresholds,
        )
    });

    let potential_profit = bet
        .potential_profit
        .unwrap_or_else(|| bet.stake * (bet.odds - 1.0).max(0.0));

    Ok(LiveBetView {
        bet,
        metrics,
        status,
        status_from_server,
        potential_profit,
    })
}

/// Project a whole poll. Records with invalid inputs are skipped with a
/// warning so one bad row never blanks the view.
pub fn project_all(bets: Vec<LiveBetRecord>, thresholds: &StatusThresholds) -> Vec<LiveBetView> {
    bets.into_iter()
        .filter_map(|bet| {
            let player = bet.player_name.clone();
            match project(bet, thresholds) {
                Ok(view) => Some(view),
                Err(e) => {
                    tracing::warn!(player = %player, error = %e, "skipping live bet");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(current: f64, target: f64, minutes: f64) -> LiveBetRecord {
        LiveBetRecord {
            player_name: "Jayson Tatum".to_string(),
            category: "Points".to_string(),
            game: "BOS x MIA".to_string(),
            target,
            current_value: current,
            remaining_minutes: minutes,
            odds: 1.9,
            stake: 100.0,
            status: None,
            potential_profit: None,
        }
    }

    #[test]
    fn test_scenario_twenty_of_twenty_five_with_five_minutes() {
        let m = derive_metrics(20.0, 25.0, 5.0).unwrap();
        assert_eq!(m.remaining_value, 5.0);
        assert_eq!(m.required_pace_per_minute, 1.0);
        assert_eq!(m.completion_percentage, 80.0);
    }

    #[test]
    fn test_completion_is_100_at_target() {
        for target in [0.5, 1.0, 7.0, 25.5, 1000.0] {
            let m = derive_metrics(target, target, 3.0).unwrap();
            assert_eq!(m.completion_percentage, 100.0, "target {}", target);
        }
    }

    #[test]
    fn test_remaining_never_negative() {
        let m = derive_metrics(31.0, 25.0, 10.0).unwrap();
        assert_eq!(m.remaining_value, 0.0);
        assert_eq!(m.required_pace_per_minute, 0.0);
        assert_eq!(m.completion_percentage, 124.0);
    }

    #[test]
    fn test_time_up_pace() {
        let short = derive_metrics(20.0, 25.0, 0.0).unwrap();
        assert!(short.required_pace_per_minute.is_infinite());
        let done = derive_metrics(25.0, 25.0, 0.0).unwrap();
        assert_eq!(done.required_pace_per_minute, 0.0);
    }

    #[test]
    fn test_invalid_inputs_are_errors() {
        assert_eq!(derive_metrics(1.0, 0.0, 5.0), Err(MetricsError::NonPositiveTarget(0.0)));
        assert!(matches!(derive_metrics(1.0, f64::NAN, 5.0), Err(MetricsError::NonPositiveTarget(_))));
        assert_eq!(derive_metrics(1.0, 10.0, -1.0), Err(MetricsError::NegativeMinutes(-1.0)));
        assert!(matches!(derive_metrics(f64::NAN, 10.0, 1.0), Err(MetricsError::NonFiniteValue(_))));
    }

    #[test]
    fn test_classify_tiers() {
        let t = StatusThresholds::default();
        // 24 points in 36 minutes (0.67/min); 12 minutes left.
        let cases = [
            (24.0, 25.0, LiveStatus::VeryLikely), // needs 0.08/min
            (24.0, 31.0, LiveStatus::Likely),     // needs 0.58/min
            (24.0, 34.0, LiveStatus::Possible),   // needs 0.83/min
            (24.0, 40.0, LiveStatus::AtRisk),     // needs 1.33/min
        ];
        for (current, target, expected) in cases {
            let m = derive_metrics(current, target, 12.0).unwrap();
            assert_eq!(classify(&m, current, target, 12.0, &t), expected, "target {}", target);
        }
    }

    #[test]
    fn test_classify_settled_tiers() {
        let t = StatusThresholds::default();
        let reached = derive_metrics(26.0, 25.0, 4.0).unwrap();
        assert_eq!(classify(&reached, 26.0, 25.0, 4.0, &t), LiveStatus::TargetReached);
        let missed = derive_metrics(20.0, 25.0, 0.0).unwrap();
        assert_eq!(classify(&missed, 20.0, 25.0, 0.0, &t), LiveStatus::TargetMissed);
    }

    #[test]
    fn test_classify_no_production_yet_is_risk() {
        let t = StatusThresholds::default();
        let m = derive_metrics(0.0, 10.0, 20.0).unwrap();
        assert_eq!(classify(&m, 0.0, 10.0, 20.0, &t), LiveStatus::AtRisk);
    }

    #[test]
    fn test_classify_before_tipoff_uses_even_spread() {
        let t = StatusThresholds::default();
        let m = derive_metrics(0.0, 24.0, 48.0).unwrap();
        // Needs exactly the even pace of 0.5/min.
        assert_eq!(classify(&m, 0.0, 24.0, 48.0, &t), LiveStatus::Likely);
    }

    #[test]
    fn test_server_label_wins() {
        let mut bet = live(24.0, 25.0, 12.0);
        bet.status = Some("Risco".to_string());
        let view = project(bet, &StatusThresholds::default()).unwrap();
        assert_eq!(view.status, LiveStatus::AtRisk);
        assert!(view.status_from_server);
    }

    #[test]
    fn test_unknown_server_label_is_kept_verbatim() {
        let mut bet = live(24.0, 25.0, 12.0);
        bet.status = Some("Em análise".to_string());
        let view = project(bet, &StatusThresholds::default()).unwrap();
        assert_eq!(view.status.label(), "Em análise");
    }

    #[test]
    fn test_potential_profit_default() {
        let view = project(live(10.0, 20.0, 10.0), &StatusThresholds::default()).unwrap();
        assert!((view.potential_profit - 90.0).abs() < 1e-9);
        assert!(!view.status_from_server);

        let mut bet = live(10.0, 20.0, 10.0);
        bet.potential_profit = Some(42.0);
        assert_eq!(project(bet, &StatusThresholds::default()).unwrap().potential_profit, 42.0);
    }

    #[test]
    fn test_project_all_skips_invalid_rows() {
        let bets = vec![live(10.0, 20.0, 10.0), live(5.0, 0.0, 10.0), live(3.0, 6.0, 2.0)];
        let views = project_all(bets, &StatusThresholds::default());
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].metrics.completion_percentage, 50.0);
    }

    #[test]
    fn test_status_labels_round_trip() {
        for s in [
            LiveStatus::TargetReached,
            LiveStatus::VeryLikely,
            LiveStatus::Likely,
            LiveStatus::Possible,
            LiveStatus::AtRisk,
            LiveStatus::TargetMissed,
        ] {
            assert_eq!(LiveStatus::from_label(s.label()), s);
        }
        assert!(LiveStatus::TargetMissed.is_settled());
        assert!(!LiveStatus::Possible.is_settled());
    }
}
