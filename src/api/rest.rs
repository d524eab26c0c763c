use super::error::ApiError;
use super::types::*;
use super::LiveBetSource;
use crate::engine::filter::FilterCriteria;
use crate::session::Session;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Every backend route the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Dashboard,
    History,
    LiveBets,
    UserBets,
    Performance,
    AddUserBet,
    ChangePassword,
    Register,
    Login,
    ResetPassword,
    ResetPasswordConfirm,
    UpdateProfile,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "/api/BettingAnalysis/dashboard",
            Endpoint::History => "/api/BettingAnalysis/history",
            Endpoint::LiveBets => "/api/BettingAnalysis/live",
            Endpoint::UserBets => "/api/UserBets/minhas-bets",
            Endpoint::Performance => "/api/UserBets/meu-saldo",
            Endpoint::AddUserBet => "/api/UserBets",
            Endpoint::ChangePassword => "/api/Account/change-password",
            Endpoint::Register => "/api/Auth/register",
            Endpoint::Login => "/api/Auth/login",
            Endpoint::ResetPassword => "/api/Auth/reset-password",
            Endpoint::ResetPasswordConfirm => "/api/Auth/reset-password-confirm",
            Endpoint::UpdateProfile => "/api/auth/update-profile",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Dashboard => "Erro ao buscar dados do dashboard",
            Endpoint::History => "Erro ao buscar histórico de apostas",
            Endpoint::LiveBets => "Erro ao buscar apostas em tempo real",
            Endpoint::UserBets => "Erro ao carregar histórico de apostas",
            Endpoint::Performance => "Erro ao carregar relatório de desempenho",
            Endpoint::AddUserBet => "Erro ao adicionar aposta",
            Endpoint::ChangePassword => "Erro ao alterar senha",
            Endpoint::Register => "Erro ao criar conta",
            Endpoint::Login => "Erro ao fazer login",
            Endpoint::ResetPassword => "Erro ao solicitar recuperação de senha",
            Endpoint::ResetPasswordConfirm => "Erro ao redefinir senha",
            Endpoint::UpdateProfile => "Erro ao atualizar perfil",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

type Query = Vec<(&'static str, String)>;

/// Drop absent and blank values so the backend never sees `key=`.
pub fn query_pairs(pairs: &[(&'static str, Option<String>)]) -> Query {
    pairs
        .iter()
        .filter_map(|(k, v)| {
            v.as_ref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (*k, v.clone()))
        })
        .collect()
}

pub fn date_range_query(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Query {
    query_pairs(&[
        ("startDate", start.map(format_query_date)),
        ("endDate", end.map(format_query_date)),
    ])
}

pub fn history_query(criteria: &FilterCriteria) -> Query {
    query_pairs(&[
        ("startDate", criteria.start_date.map(format_query_date)),
        ("endDate", criteria.end_date.map(format_query_date)),
        ("searchTerm", criteria.search_term.clone()),
        ("category", criteria.category.clone()),
    ])
}

pub struct BetApi {
    client: Client,
    base_url: String,
}

impl BetApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    pub async fn dashboard(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DashboardData, ApiError> {
        let req = self.client.get(self.url(Endpoint::Dashboard)).query(&date_range_query(start, end));
        self.send_json(Endpoint::Dashboard, req).await
    }

    /// Server-side filtering; callers still run the local filter pipeline.
    pub async fn history(&self, criteria: &FilterCriteria) -> Result<Vec<BetRecord>, ApiError> {
        let req = self.client.get(self.url(Endpoint::History)).query(&history_query(criteria));
        self.send_json(Endpoint::History, req).await
    }

    pub async fn live_bets(&self, user_id: Option<&str>) -> Result<Vec<LiveBetRecord>, ApiError> {
        let query = query_pairs(&[("userId", user_id.map(str::to_string))]);
        let req = self.client.get(self.url(Endpoint::LiveBets)).query(&query);
        self.send_json(Endpoint::LiveBets, req).await
    }

    pub async fn user_bets(
        &self,
        session: &Session,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<UserBetsResponse, ApiError> {
        let mut query = query_pairs(&[("userId", Some(session.user.id.clone()))]);
        query.extend(date_range_query(start, end));
        let req = self
            .client
            .get(self.url(Endpoint::UserBets))
            .query(&query)
            .bearer_auth(&session.token);
        self.send_json(Endpoint::UserBets, req).await
    }

    pub async fn performance(&self, session: &Session) -> Result<PerformanceReport, ApiError> {
        let req = self
            .client
            .get(self.url(Endpoint::Performance))
            .query(&[("userId", session.user.id.as_str())])
            .bearer_auth(&session.token);
        self.send_json(Endpoint::Performance, req).await
    }

    pub async fn add_user_bet(&self, session: &Session, bet: &NewUserBet) -> Result<(), ApiError> {
        let req = self
            .client
            .post(self.url(Endpoint::AddUserBet))
            .json(bet)
            .bearer_auth(&session.token);
        self.send_unit(Endpoint::AddUserBet, req).await
    }

    pub async fn change_password(
        &self,
        session: &Session,
        body: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        let req = self
            .client
            .post(self.url(Endpoint::ChangePassword))
            .json(body)
            .bearer_auth(&session.token);
        self.send_unit(Endpoint::ChangePassword, req).await
    }

    pub async fn register(&self, body: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post_json(Endpoint::Register, body).await
    }

    pub async fn login(&self, body: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post_json(Endpoint::Login, body).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let body = ResetPasswordRequest { email: email.to_string() };
        let req = self.client.post(self.url(Endpoint::ResetPassword)).json(&body);
        self.send_unit(Endpoint::ResetPassword, req).await
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let body = ResetPasswordConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        let req = self.client.post(self.url(Endpoint::ResetPasswordConfirm)).json(&body);
        self.send_unit(Endpoint::ResetPasswordConfirm, req).await
    }

    pub async fn update_profile(
        &self,
        session: &Session,
        body: &UpdateProfileRequest,
    ) -> Result<(), ApiError> {
        let req = self
            .client
            .post(self.url(Endpoint::UpdateProfile))
            .query(&[("id", session.user.id.as_str())])
            .json(body)
            .bearer_auth(&session.token);
        self.send_unit(Endpoint::UpdateProfile, req).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<T, ApiError> {
        let req = self.client.post(self.url(endpoint)).json(body);
        self.send_json(endpoint, req).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        req: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.send(endpoint, req).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%endpoint, error = %e, "failed to parse response");
            ApiError::Parse { endpoint, reason: e.to_string() }
        })
    }

    async fn send_unit(&self, endpoint: Endpoint, req: RequestBuilder) -> Result<(), ApiError> {
        self.send(endpoint, req).await.map(|_| ())
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, endpoint: Endpoint, req: RequestBuilder) -> Result<String, ApiError> {
        let resp = req.send().await.map_err(|source| {
            tracing::warn!(%endpoint, error = %source, "request failed");
            ApiError::Http { endpoint, source }
        })?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ApiError::Http { endpoint, source })?;
        if !status.is_success() {
            tracing::warn!(%endpoint, status = status.as_u16(), "request rejected");
            return Err(status_error(endpoint, status.as_u16(), body));
        }
        tracing::debug!(%endpoint, bytes = body.len(), "request ok");
        Ok(body)
    }
}

fn status_error(endpoint: Endpoint, status: u16, body: String) -> ApiError {
    let server_message = serde_json::from_str::<ApiMessage>(&body)
        .ok()
        .and_then(|m| m.message);
    ApiError::Status { endpoint, status, body, server_message }
}

#[async_trait]
impl LiveBetSource for BetApi {
    async fn fetch_live(&self, user_id: Option<&str>) -> Result<Vec<LiveBetRecord>, ApiError> {
        self.live_bets(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_query_pairs_skip_blank_values() {
        let q = query_pairs(&[
            ("a", Some("1".to_string())),
            ("b", None),
            ("c", Some("  ".to_string())),
        ]);
        assert_eq!(q, vec![("a", "1".to_string())]);
    }

    #[test]
    fn test_history_query_full() {
        let criteria = FilterCriteria {
            search_term: Some("Curry".to_string()),
            start_date: Some(d(2024, 1, 1)),
            end_date: Some(d(2024, 1, 31)),
            category: Some("ThreePoints".to_string()),
            status: None,
        };
        assert_eq!(
            history_query(&criteria),
            vec![
                ("startDate", "2024-01-01".to_string()),
                ("endDate", "2024-01-31".to_string()),
                ("searchTerm", "Curry".to_string()),
                ("category", "ThreePoints".to_string()),
            ]
        );
    }

    #[test]
    fn test_history_query_empty_criteria() {
        assert!(history_query(&FilterCriteria::default()).is_empty());
    }

    #[test]
    fn test_status_error_extracts_message() {
        let err = status_error(Endpoint::Login, 400, r#"{"message":"Credenciais inválidas"}"#.to_string());
        assert_eq!(err.user_message(), "Credenciais inválidas");

        let err = status_error(Endpoint::Login, 502, "<html>bad gateway</html>".to_string());
        assert_eq!(err.user_message(), "Erro ao fazer login");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = BetApi::new("http://localhost:7275/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url(Endpoint::LiveBets), "http://localhost:7275/api/BettingAnalysis/live");
    }
}
