use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::workflows::fetcher::EpisodeSource;

pub const OMDB_API_BASE: &str = "http://www.omdbapi.com/";

/// One entry of the `Episodes` array, kept as the API spells it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RawEpisode {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Released", default)]
    pub released: Option<String>,
    #[serde(rename = "Episode", default)]
    pub episode: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: Option<String>,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
}

#[derive(Debug, Deserialize)]
struct SeasonResponse {
    #[serde(rename = "Episodes")]
    episodes: Option<Vec<RawEpisode>>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    api_base: String,
    http: reqwest::blocking::Client,
    retries: u32,
    backoff: Duration,
}

impl OmdbClient {
    pub fn new(config: &PipelineConfig) -> PipelineResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("HTTP client: {e}")))?;
        Ok(Self::from_parts(
            config.api_base.clone(),
            http,
            config.retries,
            Duration::from_millis(config.backoff_ms),
        ))
    }

    pub fn from_parts(
        api_base: String,
        http: reqwest::blocking::Client,
        retries: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            api_base,
            http,
            retries,
            backoff,
        }
    }

    fn request_season(&self, series: &str, season: u32) -> PipelineResult<Vec<RawEpisode>> {
        let network = |message: String| PipelineError::Network {
            series: series.to_string(),
            season,
            message,
        };

        debug!(series, season, base = %self.api_base, "requesting season");
        let response = self
            .http
            .get(&self.api_base)
            .query(&[("t", series), ("Season", &season.to_string())])
            .send()
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("HTTP {status}")));
        }

        let bytes = response.bytes().map_err(|e| network(e.to_string()))?;
        let text = String::from_utf8(bytes.to_vec()).map_err(|e| PipelineError::MalformedResponse {
            series: series.to_string(),
            season,
            message: format!("body is not UTF-8: {e}"),
        })?;

        parse_season_body(series, season, &text)
    }
}

impl EpisodeSource for OmdbClient {
    fn fetch_season(&mut self, series: &str, season: u32) -> PipelineResult<Vec<RawEpisode>> {
        let mut attempt = 0;
        loop {
            match self.request_season(series, season) {
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        "{e}; retrying in {}ms ({}/{})",
                        delay.as_millis(),
                        attempt + 1,
                        self.retries
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Extracts the `Episodes` array from a season response body.
pub fn parse_season_body(series: &str, season: u32, body: &str) -> PipelineResult<Vec<RawEpisode>> {
    let malformed = |message: String| PipelineError::MalformedResponse {
        series: series.to_string(),
        season,
        message,
    };

    let parsed: SeasonResponse = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    match parsed.episodes {
        Some(episodes) => Ok(episodes),
        None => Err(malformed(
            parsed
                .error
                .unwrap_or_else(|| "no 'Episodes' key".to_string()),
        )),
    }
}
