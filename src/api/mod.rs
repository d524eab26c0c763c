pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

pub use error::ApiError;
pub use rest::{BetApi, Endpoint};

use async_trait::async_trait;
use types::LiveBetRecord;

/// Anything the live poller can pull a fresh live-bet snapshot from.
#[async_trait]
pub trait LiveBetSource: Send + Sync {
    async fn fetch_live(&self, user_id: Option<&str>) -> Result<Vec<LiveBetRecord>, ApiError>;
}
