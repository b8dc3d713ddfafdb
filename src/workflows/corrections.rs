use tracing::{debug, warn};

use crate::domain::models::EpisodeRecord;

/// Identifies one episode independently of where the API placed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    pub season: u32,
    pub title: String,
}

impl Locator {
    fn matches(&self, episode: &EpisodeRecord) -> bool {
        episode.season == self.season && episode.title == self.title
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Correction {
    /// Replace the located record, or insert it when the API never returned it.
    Upsert(EpisodeRecord),
    /// Pin the episode number of a record the API numbers differently.
    Renumber(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRule {
    pub locator: Locator,
    pub correction: Correction,
}

/// Applies every rule in order. Running the same rules twice gives the same table.
pub fn apply_manual_corrections(
    mut episodes: Vec<EpisodeRecord>,
    rules: &[CorrectionRule],
) -> Vec<EpisodeRecord> {
    for rule in rules {
        let found = episodes.iter().position(|ep| rule.locator.matches(ep));

        match (&rule.correction, found) {
            (Correction::Upsert(record), Some(idx)) => {
                debug!(season = record.season, title = %record.title, "replacing episode");
                episodes[idx] = record.clone();
            }
            (Correction::Upsert(record), None) => {
                let idx = insertion_point(&episodes, record);
                debug!(season = record.season, title = %record.title, idx, "inserting missing episode");
                episodes.insert(idx, record.clone());
            }
            (Correction::Renumber(number), Some(idx)) => {
                episodes[idx] = EpisodeRecord {
                    episode_number: *number,
                    ..episodes[idx].clone()
                };
            }
            (Correction::Renumber(_), None) => {
                warn!(
                    "No episode '{}' in season {} to renumber",
                    rule.locator.title, rule.locator.season
                );
            }
        }
    }

    episodes
}

// Inside its season, before the first episode with a higher number.
fn insertion_point(episodes: &[EpisodeRecord], record: &EpisodeRecord) -> usize {
    if let Some(idx) = episodes
        .iter()
        .position(|ep| ep.season == record.season && ep.episode_number > record.episode_number)
    {
        return idx;
    }
    if let Some(idx) = episodes.iter().rposition(|ep| ep.season == record.season) {
        return idx + 1;
    }
    episodes
        .iter()
        .position(|ep| ep.season > record.season)
        .unwrap_or(episodes.len())
}
