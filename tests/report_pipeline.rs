// History JSON through the filter pipeline into the report engine.

#[cfg(test)]
mod tests {
    use basketbet_pro::api::types::{BetRecord, BetStatus};
    use basketbet_pro::engine::filter::{self, FilterCriteria};
    use basketbet_pro::engine::report::{build_report, ReportMode, SortField, SortState};
    use basketbet_pro::engine::summary::summarize;
    use chrono::NaiveDate;

    const HISTORY: &str = r#"[
        {"id": 1, "date": "2024-03-01T20:00:00", "playerName": "LeBron James", "team": "LAL",
         "category": "Points", "target": 25.5, "result": 30, "odds": 1.9, "stake": 100, "profit": 90, "status": "Ganhou"},
        {"id": 2, "date": "2024-03-02T21:00:00", "playerName": "Stephen Curry", "team": "GSW",
         "category": "Points", "target": 28.5, "result": 20, "odds": 1.8, "stake": 50, "profit": -50, "status": "Perdeu"},
        {"id": 3, "date": "2024-03-02T22:00:00", "playerName": "Nikola Jokić", "team": "DEN",
         "category": "Assists", "target": 9.5, "result": 12, "odds": 2.0, "stake": 40, "profit": 40, "status": "Ganhou"},
        {"id": 4, "date": "2024-03-03", "playerName": "Stephen Curry", "team": "GSW",
         "category": "ThreePoints", "target": 4.5, "odds": 2.1, "stake": 30, "profit": 0, "status": "Pendente"}
    ]"#;

    fn history() -> Vec<BetRecord> {
        serde_json::from_str(HISTORY).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_category_report_from_backend_payload() {
        let bets = history();
        let rows = build_report(&bets, ReportMode::Category, None, &SortState::default());

        let points = rows.iter().find(|r| r.category.as_deref() == Some("Points")).unwrap();
        assert_eq!(points.total, 2);
        assert_eq!(points.wins, 1);
        assert_eq!(points.success_rate(), 50.0);
        assert_eq!(points.stake_total, 150.0);
        assert_eq!(points.profit_total, 40.0);

        let sum: u32 = rows.iter().map(|r| r.total).sum();
        assert_eq!(sum as usize, bets.len());
        // Descending by total: Points first.
        assert_eq!(rows[0].category.as_deref(), Some("Points"));
    }

    #[test]
    fn test_filtered_range_feeds_report() {
        let bets = history();
        let criteria = FilterCriteria {
            start_date: Some(d(2)),
            end_date: Some(d(2)),
            ..Default::default()
        };
        let filtered = filter::apply(&bets, &criteria);
        assert_eq!(filtered.len(), 2);

        let mut sort = SortState::default();
        sort.toggle(SortField::Player);
        let rows = build_report(&filtered, ReportMode::Ranking, None, &sort);
        let sum: u32 = rows.iter().map(|r| r.total).sum();
        assert_eq!(sum as usize, filtered.len());
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_inverted_range_yields_nothing() {
        let criteria = FilterCriteria {
            start_date: Some(d(3)),
            end_date: Some(d(1)),
            ..Default::default()
        };
        assert!(filter::apply(&history(), &criteria).is_empty());
        let rows = build_report(&[], ReportMode::Category, None, &SortState::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn test_player_scope_and_status_filter() {
        let bets = history();
        let rows = build_report(&bets, ReportMode::Player, Some("curry"), &SortState::default());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.player.as_deref() == Some("Stephen Curry")));

        let pending = filter::apply(
            &bets,
            &FilterCriteria {
                status: Some(BetStatus::Pending),
                ..Default::default()
            },
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "4");
    }

    #[test]
    fn test_summary_over_history() {
        let s = summarize(&history());
        assert_eq!(s.total, 4);
        assert_eq!(s.wins, 2);
        assert_eq!(s.losses, 1);
        assert_eq!(s.pending, 1);
        assert_eq!(s.stake_total, 220.0);
        assert_eq!(s.profit_total, 80.0);
    }
}
