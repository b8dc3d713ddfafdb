use crate::config::get_cache_path;
use crate::error::PipelineResult;
use crate::infra::omdb::RawEpisode;
use crate::workflows::fetcher::EpisodeSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Cache {
    #[serde(skip)]
    path: PathBuf,
    pub seasons: BTreeMap<String, BTreeMap<u32, Vec<RawEpisode>>>, // series_name -> season -> raw episodes
}

impl Cache {
    pub fn load() -> Self {
        Self::load_from(&get_cache_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let mut cache = fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Cache>(&content).ok())
            .unwrap_or_default();
        cache.path = path.to_path_buf();
        cache
    }

    pub fn save(&self) -> PipelineResult<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(std::io::Error::from)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get_season(&self, series: &str, season: u32) -> Option<&Vec<RawEpisode>> {
        // Lookup is case-insensitive
        self.seasons
            .get(&series.to_lowercase())
            .and_then(|seasons| seasons.get(&season))
    }

    pub fn set_season(&mut self, series: &str, season: u32, episodes: Vec<RawEpisode>) {
        self.seasons
            .entry(series.to_lowercase())
            .or_default()
            .insert(season, episodes);
    }
}

/// Serves seasons from the cache and records whatever the inner source fetches.
pub struct CachingSource<'a, S> {
    inner: S,
    cache: &'a mut Cache,
}

impl<'a, S: EpisodeSource> CachingSource<'a, S> {
    pub fn new(inner: S, cache: &'a mut Cache) -> Self {
        Self { inner, cache }
    }
}

impl<S: EpisodeSource> EpisodeSource for CachingSource<'_, S> {
    fn fetch_season(&mut self, series: &str, season: u32) -> PipelineResult<Vec<RawEpisode>> {
        if let Some(episodes) = self.cache.get_season(series, season) {
            debug!(series, season, "season served from cache");
            return Ok(episodes.clone());
        }
        let episodes = self.inner.fetch_season(series, season)?;
        self.cache.set_season(series, season, episodes.clone());
        Ok(episodes)
    }
}
