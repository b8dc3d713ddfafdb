use regex::Regex;
use serde::Deserialize;

use crate::domain::models::Table;
use crate::error::{PipelineError, PipelineResult};

/// Text fixes for scraped metric columns, e.g. `"18.5[12]"` -> `"18.5"`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CleanupKind {
    /// Drop a fixed number of trailing characters.
    DropTrailing { count: usize },
    /// Delete every match of a regular expression.
    Remove { pattern: String },
    /// Delete bracketed footnote markers like `[3]` or `[a]`.
    StripFootnotes,
    Trim,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CleanupRule {
    pub column: String,
    #[serde(flatten)]
    pub kind: CleanupKind,
}

enum Step {
    DropTrailing(usize),
    Remove(Regex),
    Trim,
}

impl Step {
    fn compile(kind: &CleanupKind) -> PipelineResult<Self> {
        let regex = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| PipelineError::Config(format!("bad cleanup pattern '{pattern}': {e}")))
        };
        Ok(match kind {
            CleanupKind::DropTrailing { count } => Step::DropTrailing(*count),
            CleanupKind::Remove { pattern } => Step::Remove(regex(pattern.as_str())?),
            CleanupKind::StripFootnotes => Step::Remove(regex(r"\[[^\]]*\]")?),
            CleanupKind::Trim => Step::Trim,
        })
    }

    fn apply(&self, value: &str) -> String {
        match self {
            Step::DropTrailing(count) => {
                let keep = value.chars().count().saturating_sub(*count);
                value.chars().take(keep).collect()
            }
            Step::Remove(re) => re.replace_all(value, "").into_owned(),
            Step::Trim => value.trim().to_string(),
        }
    }
}

/// Applies the rules in order to their columns. A rule naming an absent column is a schema error.
pub fn apply_cleanup(table: &mut Table, rules: &[CleanupRule], table_name: &str) -> PipelineResult<()> {
    for rule in rules {
        let idx = table.require_column(&rule.column, table_name)?;
        let step = Step::compile(&rule.kind)?;
        for row in &mut table.rows {
            if let Some(value) = row[idx].take() {
                let cleaned = step.apply(&value);
                row[idx] = Some(cleaned).filter(|v| !v.is_empty());
            }
        }
    }
    Ok(())
}
