use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::models::EpisodeRecord;
use crate::error::{PipelineError, PipelineResult};
use crate::infra::omdb::OMDB_API_BASE;
use crate::workflows::cleanup::CleanupRule;
use crate::workflows::corrections::{Correction, CorrectionRule, Locator};
use crate::workflows::merger::MergePlan;

const BUILTIN_SERIES: &str = include_str!("../config/series.toml");

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Extra attempts per season after a network failure. Zero keeps runs all-or-nothing.
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub series: Vec<SeriesConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeriesConfig {
    pub name: String,
    pub seasons: u32,
    pub supplemental: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub merge: MergePlan,
    #[serde(default)]
    pub cleanup: Vec<CleanupRule>,
    #[serde(default)]
    pub corrections: Vec<CorrectionEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorrectionEntry {
    pub season: u32,
    pub title: String,
    pub upsert: Option<EpisodePatch>,
    pub renumber: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EpisodePatch {
    pub episode: u32,
    pub released: Option<String>,
    #[serde(default)]
    pub imdb_id: String,
    pub rating: Option<f64>,
}

fn default_api_base() -> String {
    OMDB_API_BASE.to_string()
}

fn default_backoff_ms() -> u64 {
    500
}

impl PipelineConfig {
    pub fn parse(content: &str) -> PipelineResult<Self> {
        let config: PipelineConfig =
            toml::from_str(content).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn builtin() -> PipelineResult<Self> {
        Self::parse(BUILTIN_SERIES)
    }

    fn validate(&self) -> PipelineResult<()> {
        for series in &self.series {
            if series.name.trim().is_empty() {
                return Err(PipelineError::Config("series name is empty".into()));
            }
            if series.seasons == 0 {
                return Err(PipelineError::Config(format!(
                    "{}: seasons must be at least 1",
                    series.name
                )));
            }
            series.correction_rules()?;
        }
        Ok(())
    }

    pub fn find_series(&self, name: &str) -> Option<&SeriesConfig> {
        self.series
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl SeriesConfig {
    pub fn correction_rules(&self) -> PipelineResult<Vec<CorrectionRule>> {
        self.corrections
            .iter()
            .map(|entry| {
                let locator = Locator {
                    season: entry.season,
                    title: entry.title.clone(),
                };
                let correction = match (&entry.upsert, entry.renumber) {
                    (Some(patch), None) => Correction::Upsert(EpisodeRecord {
                        season: entry.season,
                        episode_number: patch.episode,
                        title: entry.title.clone(),
                        release_date: patch.released.clone(),
                        imdb_id: patch.imdb_id.clone(),
                        rating: patch.rating,
                    }),
                    (None, Some(number)) => Correction::Renumber(number),
                    _ => {
                        return Err(PipelineError::Config(format!(
                            "{}: correction for '{}' needs exactly one of upsert or renumber",
                            self.name, entry.title
                        )))
                    }
                };
                Ok(CorrectionRule {
                    locator,
                    correction,
                })
            })
            .collect()
    }
}

/// Explicit path first, then `EPISODE_RATINGS_CONFIG`, then the user config file, then the built-in presets.
pub fn load_config(explicit: Option<&Path>) -> PipelineResult<PipelineConfig> {
    let candidate = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var("EPISODE_RATINGS_CONFIG").ok().map(PathBuf::from));

    if let Some(path) = candidate {
        return load_config_file(&path);
    }

    let config_path = get_config_path();
    if config_path.exists() {
        return load_config_file(&config_path);
    }

    debug!("using built-in series presets");
    PipelineConfig::builtin()
}

fn load_config_file(path: &Path) -> PipelineResult<PipelineConfig> {
    debug!(path = %path.display(), "loading series configuration");
    let content = fs::read_to_string(path)
        .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
    PipelineConfig::parse(&content)
}

pub fn get_cache_path() -> PathBuf {
    get_config_dir_path().join("cache.json")
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join("episode-ratings"))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}

fn get_config_path() -> PathBuf {
    get_config_dir_path().join("series.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::cleanup::CleanupKind;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_presets() {
        let config = PipelineConfig::builtin().unwrap();
        assert_eq!(config.api_base, OMDB_API_BASE);
        assert_eq!(config.retries, 0);

        let seinfeld = config.find_series("seinfeld").unwrap();
        assert_eq!(seinfeld.seasons, 9);
        assert_eq!(seinfeld.merge, MergePlan::TitleThenReleased);
        assert_eq!(seinfeld.cleanup[0].column, "U.S. viewers\n(millions) ");
        assert_eq!(seinfeld.cleanup[0].kind, CleanupKind::DropTrailing { count: 4 });

        let rules = seinfeld.correction_rules().unwrap();
        match &rules[0].correction {
            Correction::Upsert(pilot) => {
                assert_eq!(pilot.title, "The Seinfeld Chronicles");
                assert_eq!(pilot.episode_number, 0);
                assert_eq!(pilot.imdb_id, "tt0098904");
                assert_eq!(pilot.rating, Some(7.9));
            }
            other => panic!("expected pilot upsert, got {other:?}"),
        }

        let friends = config.find_series("Friends").unwrap();
        assert_eq!(friends.seasons, 10);
        assert_eq!(friends.merge, MergePlan::ByTitle);
        let rules = friends.correction_rules().unwrap();
        assert_eq!(rules.len(), 4);
        assert!(rules
            .iter()
            .all(|r| matches!(&r.correction, Correction::Upsert(ep) if ep.imdb_id.is_empty())));
    }

    #[test]
    fn test_correction_needs_exactly_one_action() {
        let content = r#"
            [[series]]
            name = "Friends"
            seasons = 1
            supplemental = "wiki.csv"
            output = "out.csv"

            [[series.corrections]]
            season = 1
            title = "The Pilot"
        "#;
        let err = PipelineConfig::parse(content).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_zero_seasons_rejected() {
        let content = r#"
            [[series]]
            name = "Friends"
            seasons = 0
            supplemental = "wiki.csv"
            output = "out.csv"
        "#;
        assert!(PipelineConfig::parse(content).is_err());
    }

    #[test]
    fn test_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("series.toml");
        fs::write(
            &path,
            r#"
            api_base = "http://localhost:9999/"
            retries = 3
            timeout_secs = 5

            [[series]]
            name = "Frasier"
            seasons = 11
            supplemental = "frasierWiki.csv"
            output = "frasierData.csv"
            "#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api_base, "http://localhost:9999/");
        assert_eq!(config.retries, 3);
        assert_eq!(config.backoff_ms, 500);
        assert_eq!(config.timeout_secs, Some(5));
        assert_eq!(config.find_series("frasier").unwrap().merge, MergePlan::ByTitle);
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
