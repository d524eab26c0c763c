use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Settlement label of a historical bet. The backend speaks Portuguese;
/// the English labels are accepted as exact aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BetStatus {
    Win,
    Loss,
    Pending,
    Unknown(String),
}

impl BetStatus {
    pub fn from_label(label: &str) -> Self {
        match label {
            "Ganhou" | "win" => BetStatus::Win,
            "Perdeu" | "loss" => BetStatus::Loss,
            "Pendente" | "pending" => BetStatus::Pending,
            other => BetStatus::Unknown(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BetStatus::Win => "Ganhou",
            BetStatus::Loss => "Perdeu",
            BetStatus::Pending => "Pendente",
            BetStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, BetStatus::Win)
    }

    /// Cycle used by the "my bets" status filter.
    pub fn next_filter(&self) -> BetStatus {
        match self {
            BetStatus::Pending => BetStatus::Win,
            BetStatus::Win => BetStatus::Loss,
            _ => BetStatus::Pending,
        }
    }
}

impl From<String> for BetStatus {
    fn from(label: String) -> Self {
        BetStatus::from_label(&label)
    }
}

impl From<BetStatus> for String {
    fn from(status: BetStatus) -> Self {
        status.label().to_string()
    }
}

/// Stat categories the backend tags bets with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Points,
    Rebounds,
    Assists,
    ThreePoints,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Points,
        Category::Rebounds,
        Category::Assists,
        Category::ThreePoints,
    ];

    /// Wire tag, compared by exact equality.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::Points => "Points",
            Category::Rebounds => "Rebounds",
            Category::Assists => "Assists",
            Category::ThreePoints => "ThreePoints",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Points => "Pontos",
            Category::Rebounds => "Rebotes",
            Category::Assists => "Assistências",
            Category::ThreePoints => "Bolas de 3",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// None -> Points -> ... -> ThreePoints -> None.
    pub fn cycle(current: Option<Category>) -> Option<Category> {
        match current {
            None => Some(Category::Points),
            Some(Category::Points) => Some(Category::Rebounds),
            Some(Category::Rebounds) => Some(Category::Assists),
            Some(Category::Assists) => Some(Category::ThreePoints),
            Some(Category::ThreePoints) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(with = "bet_date")]
    pub date: NaiveDateTime,
    #[serde(alias = "jogador")]
    pub player_name: String,
    #[serde(default, alias = "time")]
    pub team: String,
    #[serde(alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "meta")]
    pub target: f64,
    #[serde(default)]
    pub result: Option<f64>,
    #[serde(default, alias = "odd")]
    pub odds: f64,
    #[serde(default)]
    pub stake: f64,
    #[serde(default)]
    pub profit: f64,
    pub status: BetStatus,
}

/// Raw live-bet snapshot. Derived projection fields are computed locally
/// by `engine::pace`; anything else the server sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBetRecord {
    pub player_name: String,
    pub category: String,
    #[serde(default)]
    pub game: String,
    pub target: f64,
    pub current_value: f64,
    pub remaining_minutes: f64,
    #[serde(default)]
    pub odds: f64,
    #[serde(default)]
    pub stake: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub potential_profit: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProfit {
    pub month: String,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub total_bets: u32,
    #[serde(default)]
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(default)]
    pub monthly_profit: f64,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub total_bets: u32,
    #[serde(default)]
    pub roi: f64,
    #[serde(default)]
    pub monthly_profits: Vec<MonthlyProfit>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBetsResponse {
    #[serde(default)]
    pub bets: Vec<BetRecord>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub total_profit: f64,
}

/// `meu-saldo` payload. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub total_bets: u32,
    #[serde(default)]
    pub total_staked: f64,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub roi: f64,
    #[serde(default)]
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserBet {
    pub id: String,
    pub user_id: String,
    pub bet_id: String,
    pub bet_title: String,
    pub odd: f64,
    pub stake: f64,
    pub meta: f64,
    pub date: DateTime<Utc>,
    pub status: BetStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub default_stake: Option<f64>,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(rename = "auth_token", alias = "authToken")]
    pub auth_token: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub default_stake: Option<f64>,
    #[serde(default)]
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordConfirm {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_stake: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

/// Error body shape used by the auth endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Bet dates arrive as RFC 3339, naive ISO datetimes, or bare dates.
pub mod bet_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_local());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, FORMAT) {
            return Some(dt);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    }

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid bet date: {raw}")))
    }
}

/// `YYYY-MM-DD`, the format every date query parameter uses.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
