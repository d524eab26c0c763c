use crate::api::types::{BetRecord, BetStatus};

/// Header figures for any slice of bets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetSummary {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub pending: u32,
    pub stake_total: f64,
    pub profit_total: f64,
    /// Percent of all bets that won.
    pub success_rate: f64,
    /// Profit over stake, percent.
    pub roi: f64,
}

pub fn summarize(bets: &[BetRecord]) -> BetSummary {
    let mut s = BetSummary::default();
    for bet in bets {
        s.total += 1;
        s.stake_total += bet.stake;
        s.profit_total += bet.profit;
        match bet.status {
            BetStatus::Win => s.wins += 1,
            BetStatus::Loss => s.losses += 1,
            BetStatus::Pending => s.pending += 1,
            BetStatus::Unknown(_) => {}
        }
    }
    if s.total > 0 {
        s.success_rate = s.wins as f64 / s.total as f64 * 100.0;
    }
    if s.stake_total > 0.0 {
        s.roi = s.profit_total / s.stake_total * 100.0;
    }
    s
}
