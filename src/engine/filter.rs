use crate::api::types::{BetRecord, BetStatus};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Criteria for the history and "my bets" views. Every `None` field is
/// unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Exact category tag, e.g. `Points`.
    pub category: Option<String>,
    pub status: Option<BetStatus>,
}

impl FilterCriteria {
    pub fn has_inverted_range(&self) -> bool {
        matches!((self.start_date, self.end_date), (Some(s), Some(e)) if s > e)
    }

    fn term(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Inclusive upper bound: 23:59:59.999 on the end date.
fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| start_of_day(date))
}

fn matches_term(bet: &BetRecord, term: &str) -> bool {
    bet.player_name.to_lowercase().contains(term) || bet.team.to_lowercase().contains(term)
}

pub fn matches(bet: &BetRecord, criteria: &FilterCriteria) -> bool {
    if let Some(term) = criteria.term() {
        if !matches_term(bet, &term) {
            return false;
        }
    }
    if let Some(start) = criteria.start_date {
        if bet.date < start_of_day(start) {
            return false;
        }
    }
    if let Some(end) = criteria.end_date {
        if bet.date > end_of_day(end) {
            return false;
        }
    }
    if let Some(category) = criteria.category.as_deref() {
        if bet.category != category {
            return false;
        }
    }
    if let Some(status) = &criteria.status {
        if &bet.status != status {
            return false;
        }
    }
    true
}

/// Keep the bets matching every criterion, in input order.
pub fn apply(bets: &[BetRecord], criteria: &FilterCriteria) -> Vec<BetRecord> {
    if criteria.has_inverted_range() {
        return Vec::new();
    }
    bets.iter().filter(|b| matches(b, criteria)).cloned().collect()
}

/// Sorted, de-duplicated player names containing `term`, for the search
/// autocomplete. An empty term lists everyone.
pub fn player_suggestions(bets: &[BetRecord], term: &str, limit: usize) -> Vec<String> {
    let term = term.trim().to_lowercase();
    let mut names: Vec<String> = bets
        .iter()
        .filter(|b| term.is_empty() || b.player_name.to_lowercase().contains(&term))
        .map(|b| b.player_name.clone())
        .collect();
    names.sort_by(|a, b| super::report::compare_text(a, b));
    names.dedup();
    names.truncate(limit);
    names
}
