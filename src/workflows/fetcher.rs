use tracing::info;

use crate::domain::models::EpisodeRecord;
use crate::error::{PipelineError, PipelineResult};
use crate::infra::omdb::RawEpisode;

/// Anything that can hand back the raw episode list of one season.
pub trait EpisodeSource {
    fn fetch_season(&mut self, series: &str, season: u32) -> PipelineResult<Vec<RawEpisode>>;
}

/// Fetches seasons `1..=seasons` in order and normalizes every entry.
///
/// The first failure aborts the whole fetch; nothing fetched so far is returned.
pub fn fetch_episodes<S: EpisodeSource + ?Sized>(
    source: &mut S,
    series: &str,
    seasons: u32,
) -> PipelineResult<Vec<EpisodeRecord>> {
    let mut episodes = Vec::new();

    for season in 1..=seasons {
        let raw = source.fetch_season(series, season)?;
        info!(series, season, count = raw.len(), "fetched season");
        episodes.reserve(raw.len());
        for entry in &raw {
            episodes.push(normalize_episode(series, season, entry)?);
        }
    }

    Ok(episodes)
}

/// Maps one API entry to a typed record. The API does not repeat the season, so the caller supplies it.
pub fn normalize_episode(series: &str, season: u32, raw: &RawEpisode) -> PipelineResult<EpisodeRecord> {
    let malformed = |message: String| PipelineError::MalformedResponse {
        series: series.to_string(),
        season,
        message,
    };

    let title = raw.title.trim();
    if title.is_empty() {
        return Err(malformed(format!("episode '{}' has no title", raw.episode)));
    }

    let episode_number = raw
        .episode
        .trim()
        .parse::<u32>()
        .map_err(|_| malformed(format!("'{}' has invalid episode number '{}'", title, raw.episode)))?;

    let rating = match available(raw.imdb_rating.as_deref()) {
        Some(text) => Some(
            text.parse::<f64>()
                .ok()
                .filter(|r| (0.0..=10.0).contains(r))
                .ok_or_else(|| malformed(format!("'{title}' has invalid rating '{text}'")))?,
        ),
        None => None,
    };

    Ok(EpisodeRecord {
        season,
        episode_number,
        title: title.to_string(),
        release_date: available(raw.released.as_deref()).map(str::to_string),
        imdb_id: raw.imdb_id.trim().to_string(),
        rating,
    })
}

// OMDb reports unknown values as "N/A"
fn available(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("N/A"))
}
