use std::collections::HashSet;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::models::Table;
use crate::error::{PipelineError, PipelineResult};

/// Reads a comma-delimited file with a header row. Empty fields become missing cells.
///
/// Repeated header names are made unique by suffixing `.1`, `.2`, ... to the later copies.
pub fn read_table(path: &Path) -> PipelineResult<Table> {
    if !path.is_file() {
        return Err(PipelineError::FileNotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let columns = unique_columns(reader.headers()?.iter());

    let mut table = Table::new(columns);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(|field| Some(field.to_string())).collect());
    }

    debug!(path = %path.display(), rows = table.len(), "loaded delimited file");
    Ok(table)
}

fn unique_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut copy = 1;
        while seen.contains(&name) {
            name = format!("{header}.{copy}");
            copy += 1;
        }
        seen.insert(name.clone());
        columns.push(name);
    }
    columns
}

/// Writes the table with its header, no index column.
///
/// Rows go to a temporary file next to `path` which replaces the target only
/// once everything is written, so an interrupted run leaves no partial output.
pub fn write_table(table: &Table, path: &Path) -> PipelineResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(directory)?;
    {
        let mut writer = csv::Writer::from_writer(&mut temp);
        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), rows = table.len(), "wrote delimited file");
    Ok(())
}
