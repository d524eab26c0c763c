//! Grouped report tables: per category, per player and category, or a
//! global player ranking, with a stable user-selectable sort.

use crate::api::types::BetRecord;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportMode {
    #[default]
    Category,
    Player,
    Ranking,
}

impl ReportMode {
    pub const ALL: [ReportMode; 3] = [ReportMode::Category, ReportMode::Player, ReportMode::Ranking];

    pub fn label(&self) -> &'static str {
        match self {
            ReportMode::Category => "Por categoria",
            ReportMode::Player => "Por jogador",
            ReportMode::Ranking => "Ranking",
        }
    }

    pub fn next(&self) -> ReportMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ReportMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "categoria" | "category" => Ok(ReportMode::Category),
            "jogador" | "player" => Ok(ReportMode::Player),
            "ranking" => Ok(ReportMode::Ranking),
            other => Err(UnknownVariant {
                kind: "report mode",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Total,
    StakeTotal,
    ProfitTotal,
    Wins,
    Category,
    Player,
}

impl SortField {
    /// Column order in the report table.
    pub const ALL: [SortField; 6] = [
        SortField::Category,
        SortField::Player,
        SortField::Total,
        SortField::Wins,
        SortField::StakeTotal,
        SortField::ProfitTotal,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            SortField::Total => "Total",
            SortField::StakeTotal => "Stake",
            SortField::ProfitTotal => "Lucro",
            SortField::Wins => "Vitórias",
            SortField::Category => "Categoria",
            SortField::Player => "Jogador",
        }
    }
}

impl FromStr for SortField {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "total" => Ok(SortField::Total),
            "staketotal" | "stake" => Ok(SortField::StakeTotal),
            "profittotal" | "profit" | "lucro" => Ok(SortField::ProfitTotal),
            "wins" | "vitorias" | "vitórias" => Ok(SortField::Wins),
            "categoria" | "category" => Ok(SortField::Category),
            "jogador" | "player" => Ok(SortField::Player),
            other => Err(UnknownVariant {
                kind: "sort field",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortState {
    /// Same field flips direction; a new field starts descending.
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flip();
        } else {
            self.field = field;
            self.direction = SortDirection::Descending;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregateRow {
    pub category: Option<String>,
    pub player: Option<String>,
    pub total: u32,
    pub stake_total: f64,
    pub profit_total: f64,
    pub wins: u32,
}

impl AggregateRow {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.wins as f64 / self.total as f64 * 100.0
        }
    }

    fn add(&mut self, bet: &BetRecord) {
        self.total += 1;
        self.stake_total += bet.stake;
        self.profit_total += bet.profit;
        if bet.status.is_win() {
            self.wins += 1;
        }
    }
}

/// "0%" only for an empty group; any group with bets keeps two decimals.
pub fn format_success_rate(rate: f64, total: u32) -> String {
    if total == 0 || !rate.is_finite() {
        "0%".to_string()
    } else {
        format!("{:.2}%", rate)
    }
}

/// Group bets by the mode's key. Groups appear in first-seen order.
///
/// `player_scope` narrows `Player` mode to names containing it
/// (case-insensitive); other modes ignore it.
pub fn aggregate(bets: &[BetRecord], mode: ReportMode, player_scope: Option<&str>) -> Vec<AggregateRow> {
    let scope = player_scope
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut rows: Vec<AggregateRow> = Vec::new();
    let mut index: HashMap<(Option<&str>, Option<&str>), usize> = HashMap::new();

    for bet in bets {
        let key = match mode {
            ReportMode::Category => (Some(bet.category.as_str()), None),
            ReportMode::Player => {
                if let Some(scope) = &scope {
                    if !bet.player_name.to_lowercase().contains(scope.as_str()) {
                        continue;
                    }
                }
                (Some(bet.category.as_str()), Some(bet.player_name.as_str()))
            }
            ReportMode::Ranking => (None, Some(bet.player_name.as_str())),
        };

        let slot = *index.entry(key).or_insert_with(|| {
            rows.push(AggregateRow {
                category: key.0.map(str::to_string),
                player: key.1.map(str::to_string),
                ..Default::default()
            });
            rows.len() - 1
        });
        rows[slot].add(bet);
    }

    rows
}

/// Accent- and case-insensitive sort key: NFD, combining marks dropped,
/// lowercased.
pub fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-style text ordering with the raw string as tiebreak.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn compare_optional_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_text(a, b),
        _ => Ordering::Equal,
    }
}

fn compare_by(field: SortField, a: &AggregateRow, b: &AggregateRow) -> Ordering {
    match field {
        SortField::Total => a.total.cmp(&b.total),
        SortField::Wins => a.wins.cmp(&b.wins),
        SortField::StakeTotal => a.stake_total.total_cmp(&b.stake_total),
        SortField::ProfitTotal => a.profit_total.total_cmp(&b.profit_total),
        SortField::Category => compare_optional_text(a.category.as_deref(), b.category.as_deref()),
        SortField::Player => compare_optional_text(a.player.as_deref(), b.player.as_deref()),
    }
}

/// Stable sort; ties keep their grouping order in both directions.
pub fn sort_rows(rows: &mut [AggregateRow], sort: &SortState) {
    match sort.direction {
        SortDirection::Ascending => rows.sort_by(|a, b| compare_by(sort.field, a, b)),
        SortDirection::Descending => rows.sort_by(|a, b| compare_by(sort.field, b, a)),
    }
}

pub fn build_report(
    bets: &[BetRecord],
    mode: ReportMode,
    player_scope: Option<&str>,
    sort: &SortState,
) -> Vec<AggregateRow> {
    let mut rows = aggregate(bets, mode, player_scope);
    sort_rows(&mut rows, sort);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::BetStatus;
    use chrono::NaiveDate;

    fn bet(player: &str, category: &str, stake: f64, profit: f64, status: BetStatus) -> BetRecord {
        BetRecord {
            id: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1)
                .unwrap()
                .and_hms_opt(20, 0, 0)
                .unwrap(),
            player_name: player.to_string(),
            team: String::new(),
            category: category.to_string(),
            target: 10.0,
            result: None,
            odds: 2.0,
            stake,
            profit,
            status,
        }
    }

    fn sample() -> Vec<BetRecord> {
        vec![
            bet("Nikola Jokić", "Points", 100.0, 90.0, BetStatus::Win),
            bet("Nikola Jokić", "Rebounds", 40.0, -40.0, BetStatus::Loss),
            bet("Ja Morant", "Assists", 30.0, 30.0, BetStatus::Win),
            bet("Ja Morant", "Points", 50.0, -50.0, BetStatus::Loss),
            bet("Ja Morant", "Assists", 20.0, 0.0, BetStatus::Pending),
            bet("Ámen Thompson", "Rebounds", 10.0, 12.0, BetStatus::Win),
        ]
    }

    #[test]
    fn test_points_scenario() {
        let bets = vec![
            bet("A", "Points", 100.0, 90.0, BetStatus::Win),
            bet("B", "Points", 50.0, -50.0, BetStatus::Loss),
        ];
        let rows = aggregate(&bets, ReportMode::Category, None);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.category.as_deref(), Some("Points"));
        assert_eq!(row.total, 2);
        assert_eq!(row.wins, 1);
        assert_eq!(row.success_rate(), 50.0);
        assert_eq!(row.stake_total, 150.0);
        assert_eq!(row.profit_total, 40.0);
    }

    #[test]
    fn test_category_totals_sum_to_input_length() {
        let bets = sample();
        let rows = aggregate(&bets, ReportMode::Category, None);
        assert_eq!(rows.iter().map(|r| r.total as usize).sum::<usize>(), bets.len());
        assert!(rows.iter().all(|r| r.player.is_none()));
    }

    #[test]
    fn test_only_exact_win_counts() {
        let bets = vec![
            bet("A", "Points", 10.0, 0.0, BetStatus::Unknown("Ganhou parcialmente".to_string())),
            bet("A", "Points", 10.0, 0.0, BetStatus::Win),
        ];
        let rows = aggregate(&bets, ReportMode::Ranking, None);
        assert_eq!(rows[0].wins, 1);
    }

    #[test]
    fn test_player_mode_groups_by_player_and_category() {
        let rows = aggregate(&sample(), ReportMode::Player, None);
        assert_eq!(rows.len(), 5);
        let assists = rows
            .iter()
            .find(|r| r.player.as_deref() == Some("Ja Morant") && r.category.as_deref() == Some("Assists"))
            .unwrap();
        assert_eq!(assists.total, 2);
        assert_eq!(assists.stake_total, 50.0);
    }

    #[test]
    fn test_player_mode_scope() {
        let rows = aggregate(&sample(), ReportMode::Player, Some("jokić"));
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.player.as_deref() == Some("Nikola Jokić")));
        // Scope is ignored outside player mode.
        assert_eq!(aggregate(&sample(), ReportMode::Ranking, Some("jokić")).len(), 3);
    }

    #[test]
    fn test_ranking_ignores_categories() {
        let rows = build_report(&sample(), ReportMode::Ranking, None, &SortState::default());
        let players: Vec<_> = rows.iter().map(|r| r.player.as_deref().unwrap()).collect();
        assert_eq!(players, vec!["Ja Morant", "Nikola Jokić", "Ámen Thompson"]);
        assert!(rows.iter().all(|r| r.category.is_none()));
        assert_eq!(rows[0].total, 3);
    }

    #[test]
    fn test_zero_total_rate() {
        let row = AggregateRow::default();
        assert_eq!(row.success_rate(), 0.0);
        assert_eq!(format_success_rate(row.success_rate(), row.total), "0%");
        assert_eq!(format_success_rate(100.0 / 3.0, 3), "33.33%");
    }

    #[test]
    fn test_no_wins_rate_keeps_decimals() {
        let row = AggregateRow {
            total: 4,
            ..AggregateRow::default()
        };
        assert_eq!(format_success_rate(row.success_rate(), row.total), "0.00%");
    }

    #[test]
    fn test_mode_cycle_covers_all() {
        let mut mode = ReportMode::default();
        let mut seen = Vec::new();
        for _ in 0..ReportMode::ALL.len() {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(seen, ReportMode::ALL.to_vec());
        assert_eq!(mode, ReportMode::Category);
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "semana".parse::<ReportMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown report mode: semana");
        let err = " Odds ".parse::<SortField>().unwrap_err();
        assert_eq!(err.kind, "sort field");
        assert_eq!(err.to_string(), "unknown sort field: odds");
    }

    #[test]
    fn test_toggle_rules() {
        let mut sort = SortState::default();
        assert_eq!(sort.field, SortField::Total);
        assert_eq!(sort.direction, SortDirection::Descending);

        sort.toggle(SortField::Total);
        assert_eq!(sort.direction, SortDirection::Ascending);

        sort.toggle(SortField::ProfitTotal);
        assert_eq!(sort.field, SortField::ProfitTotal);
        assert_eq!(sort.direction, SortDirection::Descending);
    }

    #[test]
    fn test_double_toggle_restores_order() {
        let bets = sample();
        for field in SortField::ALL {
            let mut sort = SortState::default();
            sort.toggle(field);
            let before = build_report(&bets, ReportMode::Player, None, &sort);
            sort.toggle(field);
            sort.toggle(field);
            let after = build_report(&bets, ReportMode::Player, None, &sort);
            assert_eq!(before, after, "field {:?}", field);
        }
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let bets = vec![
            bet("B", "Points", 10.0, 0.0, BetStatus::Win),
            bet("A", "Points", 10.0, 0.0, BetStatus::Win),
            bet("C", "Points", 10.0, 0.0, BetStatus::Win),
        ];
        let sort = SortState {
            field: SortField::Total,
            direction: SortDirection::Descending,
        };
        let rows = build_report(&bets, ReportMode::Ranking, None, &sort);
        let players: Vec<_> = rows.iter().map(|r| r.player.clone().unwrap()).collect();
        assert_eq!(players, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_text_sort_is_accent_insensitive() {
        let sort = SortState {
            field: SortField::Player,
            direction: SortDirection::Ascending,
        };
        let rows = build_report(&sample(), ReportMode::Ranking, None, &sort);
        let players: Vec<_> = rows.iter().map(|r| r.player.as_deref().unwrap()).collect();
        assert_eq!(players, vec!["Ámen Thompson", "Ja Morant", "Nikola Jokić"]);
    }

    #[test]
    fn test_missing_text_field_compares_equal() {
        let sort = SortState {
            field: SortField::Category,
            direction: SortDirection::Ascending,
        };
        let unsorted = aggregate(&sample(), ReportMode::Ranking, None);
        let rows = build_report(&sample(), ReportMode::Ranking, None, &sort);
        assert_eq!(rows, unsorted);
    }

    #[test]
    fn test_collation_key() {
        assert_eq!(collation_key("Luka Dončić"), "luka doncic");
        assert_eq!(collation_key("ÁMEN"), "amen");
        assert_eq!(compare_text("amen", "Ámen"), Ordering::Less);
        assert_eq!(compare_text("Ámen", "beta"), Ordering::Less);
    }

    #[test]
    fn test_parse_mode_and_field() {
        assert_eq!("jogador".parse::<ReportMode>().unwrap(), ReportMode::Player);
        assert_eq!("Category".parse::<ReportMode>().unwrap(), ReportMode::Category);
        assert!("weekly".parse::<ReportMode>().is_err());
        assert_eq!("stakeTotal".parse::<SortField>().unwrap(), SortField::StakeTotal);
        assert_eq!("categoria".parse::<SortField>().unwrap(), SortField::Category);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_report(&[], ReportMode::Category, None, &SortState::default()).is_empty());
    }
}
