use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::domain::models::{
    Supplemental, SupplementalRecord, Table, RELEASED_COLUMN, TITLE_COLUMN,
};
use crate::error::PipelineResult;
use crate::infra::delimited;
use crate::workflows::cleanup::{apply_cleanup, CleanupRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep left rows that have a match.
    Inner,
    /// Keep every left row, with empty right-side cells when unmatched.
    LeftOuter,
}

/// How fetched episodes and supplemental rows are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergePlan {
    /// Inner join on `Title`.
    #[default]
    ByTitle,
    /// Inner join on `Title`, then the full episode table left-joined onto that result on `Released`.
    ///
    /// Unlike a plain dataframe merge, episodes whose date the API reports as `N/A` never
    /// match each other here, so they are not multiplied in the output.
    TitleThenReleased,
}

pub fn load_supplemental(path: &Path, cleanup: &[CleanupRule]) -> PipelineResult<Supplemental> {
    let name = path.display().to_string();
    let mut table = delimited::read_table(path)?;
    apply_cleanup(&mut table, cleanup, &name)?;
    let title_idx = table.require_column(TITLE_COLUMN, &name)?;

    let records = table
        .rows
        .iter()
        .map(|row| SupplementalRecord {
            title: row[title_idx].clone().unwrap_or_default(),
            fields: table
                .columns
                .iter()
                .zip(row)
                .enumerate()
                .filter(|(i, _)| *i != title_idx)
                .map(|(_, (column, value))| (column.clone(), value.clone()))
                .collect(),
        })
        .collect();

    Ok(Supplemental {
        columns: table.columns,
        records,
    })
}

/// Equality join on `key`, shaped like a dataframe merge.
///
/// The key column appears once at its left position and right columns follow the
/// left ones. Other column names present on both sides get `_x` (left) and `_y`
/// (right) suffixes. Rows keep left order; several matches follow right order.
/// Missing key cells never match.
pub fn join_on_key(left: &Table, right: &Table, key: &str, kind: JoinKind) -> PipelineResult<Table> {
    let left_key = left.require_column(key, "left side of join")?;
    let right_key = right.require_column(key, "right side of join")?;

    let shared = |name: &str| name != key && left.column_index(name).is_some() && right.column_index(name).is_some();

    let mut columns: Vec<String> = left
        .columns
        .iter()
        .map(|c| if shared(c.as_str()) { format!("{c}_x") } else { c.clone() })
        .collect();
    columns.extend(
        right
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != right_key)
            .map(|(_, c)| if shared(c.as_str()) { format!("{c}_y") } else { c.clone() }),
    );

    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, row) in right.rows.iter().enumerate() {
        if let Some(value) = row[right_key].as_deref() {
            by_key.entry(value).or_default().push(idx);
        }
    }

    let mut joined = Table::new(columns);
    let right_width = right.columns.len() - 1;

    for row in &left.rows {
        let matches = row[left_key]
            .as_deref()
            .and_then(|value| by_key.get(value))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        if matches.is_empty() {
            if kind == JoinKind::LeftOuter {
                let mut out = row.clone();
                out.extend(std::iter::repeat(None).take(right_width));
                joined.push_row(out);
            }
            continue;
        }

        for &m in matches {
            let mut out = row.clone();
            out.extend(
                right.rows[m]
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != right_key)
                    .map(|(_, cell)| cell.clone()),
            );
            joined.push_row(out);
        }
    }

    Ok(joined)
}

pub fn merge(episodes: &Table, supplemental: &Table, plan: MergePlan) -> PipelineResult<Table> {
    let by_title = join_on_key(episodes, supplemental, TITLE_COLUMN, JoinKind::Inner)?;
    info!(rows = by_title.len(), "joined supplemental rows on title");

    match plan {
        MergePlan::ByTitle => Ok(by_title),
        MergePlan::TitleThenReleased => {
            let by_date = join_on_key(episodes, &by_title, RELEASED_COLUMN, JoinKind::LeftOuter)?;
            info!(rows = by_date.len(), "reattached episodes on release date");
            Ok(by_date)
        }
    }
}
