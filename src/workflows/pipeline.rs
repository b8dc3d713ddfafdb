use std::path::PathBuf;
use tracing::info;

use crate::config::SeriesConfig;
use crate::domain::models::Table;
use crate::error::PipelineResult;
use crate::infra::delimited;
use crate::workflows::corrections::apply_manual_corrections;
use crate::workflows::fetcher::{fetch_episodes, EpisodeSource};
use crate::workflows::merger::{load_supplemental, merge};

#[derive(Debug)]
pub struct Summary {
    pub series: String,
    pub episodes: usize,
    pub rows: usize,
    pub output: PathBuf,
}

/// Fetch, correct, merge and write one series. The output file is only touched at the very end.
pub fn run_series<S: EpisodeSource + ?Sized>(
    series: &SeriesConfig,
    source: &mut S,
) -> PipelineResult<Summary> {
    let rules = series.correction_rules()?;

    let fetched = fetch_episodes(source, &series.name, series.seasons)?;
    let fetched_count = fetched.len();
    let episodes = apply_manual_corrections(fetched, &rules);
    info!(
        series = %series.name,
        fetched = fetched_count,
        corrected = episodes.len(),
        "episode table ready"
    );

    let supplemental = load_supplemental(&series.supplemental, &series.cleanup)?;
    let merged = merge(
        &Table::from_episodes(&episodes),
        &Table::from_supplemental(&supplemental),
        series.merge,
    )?;

    delimited::write_table(&merged, &series.output)?;

    Ok(Summary {
        series: series.name.clone(),
        episodes: episodes.len(),
        rows: merged.len(),
        output: series.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CorrectionEntry, EpisodePatch};
    use crate::error::PipelineError;
    use crate::workflows::fetcher::tests::FakeSource;
    use crate::workflows::merger::MergePlan;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn series(dir: &Path, seasons: u32, merge: MergePlan) -> SeriesConfig {
        SeriesConfig {
            name: "Seinfeld".into(),
            seasons,
            supplemental: dir.join("seinfeldWiki.csv"),
            output: dir.join("seinfeldData.csv"),
            merge,
            cleanup: Vec::new(),
            corrections: vec![CorrectionEntry {
                season: 1,
                title: "The Seinfeld Chronicles".into(),
                upsert: Some(EpisodePatch {
                    episode: 0,
                    released: Some("1990-07-05".into()),
                    imdb_id: "tt0098904".into(),
                    rating: Some(7.9),
                }),
                renumber: None,
            }],
        }
    }

    fn source() -> FakeSource {
        FakeSource::new()
            .with_season(1, &["The Stakeout", "The Robbery", "Male Unbonding", "The Stock Tip"])
            .with_season(2, &["The Ex-Girlfriend"])
    }

    #[test]
    fn test_run_series_writes_merged_table() {
        let temp_dir = TempDir::new().unwrap();
        let config = series(temp_dir.path(), 2, MergePlan::ByTitle);
        fs::write(
            &config.supplemental,
            "Title,Viewers\nThe Seinfeld Chronicles,15.4\nThe Stakeout,13.9\nThe Pilot,20.1\n",
        )
        .unwrap();

        let summary = run_series(&config, &mut source()).unwrap();
        assert_eq!(summary.episodes, 6);
        assert_eq!(summary.rows, 2);

        let written = delimited::read_table(&config.output).unwrap();
        assert_eq!(
            written.columns,
            vec!["Season", "Episode", "Title", "Released", "imdbID", "imdbRating", "Viewers"]
        );
        assert_eq!(written.cell(0, "Title"), Some("The Seinfeld Chronicles"));
        assert_eq!(written.cell(0, "Episode"), Some("0"));
        assert_eq!(written.cell(0, "Viewers"), Some("15.4"));
        assert_eq!(written.cell(1, "Title"), Some("The Stakeout"));
    }

    #[test]
    fn test_run_series_two_stage_plan_keeps_unmatched_episodes() {
        let temp_dir = TempDir::new().unwrap();
        let config = series(temp_dir.path(), 2, MergePlan::TitleThenReleased);
        fs::write(&config.supplemental, "Title,Viewers\nThe Stakeout,13.9\n").unwrap();

        let summary = run_series(&config, &mut source()).unwrap();
        // every fetched episode shares one release date, so the single title match
        // is reattached to all of them; only the pilot stays unmatched
        assert_eq!(summary.rows, 6);
        let written = delimited::read_table(&config.output).unwrap();
        assert_eq!(written.cell(0, "Title_x"), Some("The Seinfeld Chronicles"));
        assert_eq!(written.cell(0, "Viewers"), None);
        assert_eq!(written.cell(1, "Viewers"), Some("13.9"));
    }

    #[test]
    fn test_fetch_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = series(temp_dir.path(), 3, MergePlan::ByTitle);
        fs::write(&config.supplemental, "Title,Viewers\n").unwrap();

        let err = run_series(&config, &mut source()).unwrap_err();
        assert!(matches!(err, PipelineError::Network { season: 3, .. }));
        assert!(!config.output.exists());
    }

    #[test]
    fn test_missing_supplemental_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = series(temp_dir.path(), 2, MergePlan::ByTitle);

        let err = run_series(&config, &mut source()).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
        assert!(!config.output.exists());
    }
}
