use crate::error::{PipelineError, PipelineResult};

/// One episode as it leaves the fetcher, typed at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub season: u32,
    pub episode_number: u32,
    pub title: String,
    pub release_date: Option<String>,
    pub imdb_id: String,
    pub rating: Option<f64>,
}

/// Header order of the episode table.
pub const EPISODE_COLUMNS: [&str; 6] = [
    "Season",
    "Episode",
    "Title",
    "Released",
    "imdbID",
    "imdbRating",
];

pub const TITLE_COLUMN: &str = "Title";
pub const RELEASED_COLUMN: &str = "Released";

#[derive(Debug, Clone, PartialEq)]
pub struct SupplementalRecord {
    pub title: String,
    /// Remaining columns in file order.
    pub fields: Vec<(String, Option<String>)>,
}

/// Supplemental rows together with the header they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Supplemental {
    pub columns: Vec<String>,
    pub records: Vec<SupplementalRecord>,
}

pub type Cell = Option<String>;

/// Column-ordered table of optional text cells. Joins and serialization work on this.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Empty strings are stored as missing cells so a written table reloads unchanged.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows
            .push(row.into_iter().map(|c| c.filter(|s| !s.is_empty())).collect());
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str, table: &str) -> PipelineResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::schema(name, table))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    pub fn from_episodes(episodes: &[EpisodeRecord]) -> Self {
        let mut table = Table::new(EPISODE_COLUMNS.iter().map(|c| c.to_string()).collect());
        for ep in episodes {
            table.push_row(vec![
                Some(ep.season.to_string()),
                Some(ep.episode_number.to_string()),
                Some(ep.title.clone()),
                ep.release_date.clone(),
                Some(ep.imdb_id.clone()),
                ep.rating.map(|r| r.to_string()),
            ]);
        }
        table
    }

    /// Cells are placed by position: `fields` holds every non-title column in header order.
    pub fn from_supplemental(supplemental: &Supplemental) -> Self {
        let mut table = Table::new(supplemental.columns.clone());
        for record in &supplemental.records {
            let mut fields = record.fields.iter();
            let row = supplemental
                .columns
                .iter()
                .map(|column| {
                    if column == TITLE_COLUMN {
                        return Some(record.title.clone());
                    }
                    fields.next().and_then(|(_, value)| value.clone())
                })
                .collect();
            table.push_row(row);
        }
        table
    }
}
