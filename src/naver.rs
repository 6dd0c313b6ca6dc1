use std::time::Duration;

use tracing::{error, info, info_span, instrument};

use crate::error::RemoteFetchError;
use crate::model::remote::{RemoteGameRecord, ScheduleDocument};
use crate::model::window::DateRange;
use crate::reconcile::RemoteSource;

pub const DEFAULT_BASE_URL: &str = "https://api-gw.sports.naver.com";

/// Client for the public schedule endpoint behind Naver Sports.
#[derive(Debug, Clone)]
pub struct NaverSource {
    base_url: String,
    agent: ureq::Agent,
}

impl NaverSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            // Non-2xx is inspected below so the status ends up in the error.
            .http_status_as_error(false)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: ureq::Agent::new_with_config(config),
        }
    }

    /// Full request URL for one window, dates as `YYYYMMDD`.
    pub fn schedule_url(&self, window: &DateRange, sport_id: &str) -> String {
        format!(
            "{}/schedule/games?fields=basic,superMetrics&sportId={}&startDate={}&endDate={}",
            self.base_url,
            sport_id,
            window.start().format("%Y%m%d"),
            window.end().format("%Y%m%d"),
        )
    }

    /// Parse a raw response body into the batch of games (no network).
    #[instrument(level = "info", skip(body), fields(bytes = body.len()))]
    pub fn parse_batch(body: &str) -> Result<Vec<RemoteGameRecord>, RemoteFetchError> {
        let doc: ScheduleDocument = serde_json::from_str(body)?;
        Ok(doc.result.games)
    }
}

impl RemoteSource for NaverSource {
    fn fetch(&self, window: &DateRange, sport_id: &str) -> Result<Vec<RemoteGameRecord>, RemoteFetchError> {
        let url = self.schedule_url(window, sport_id);
        let response = {
            let _span = info_span!("naver_fetch", url = %url).entered();
            self.agent.get(&url).call()
        };

        let response = response.map_err(|e| {
            error!(error = %e, url = %url, "Request failed");
            RemoteFetchError::Transport {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            error!(status, url = %url, "Schedule endpoint returned non-success status");
            return Err(RemoteFetchError::Status { url, status });
        }

        let mut body_reader = response.into_body();
        let body = body_reader.read_to_string().map_err(|e| {
            error!(error = %e, "Failed to read response body");
            RemoteFetchError::Body {
                url: url.clone(),
                message: e.to_string(),
            }
        })?;

        let games = Self::parse_batch(&body).inspect_err(|e| {
            error!(error = %e, "Failed to deserialize schedule payload");
        })?;
        info!(fetched = games.len(), %window, "Fetched remote games");
        Ok(games)
    }
}
