//! Export of stored items and captions
//!
//! JSON exports write a single document. CSV exports write one file per
//! table; with `--table all` the captions go to a sibling file named
//! `<stem>_captions.csv`.

use crate::models::CaptionTrack;
use crate::output::OutputError;
use crate::storage::{ItemRecord, Store};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{}' (expected json or csv)", other)),
        }
    }
}

/// Which tables to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTable {
    Items,
    Captions,
    All,
}

impl FromStr for ExportTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "items" => Ok(Self::Items),
            "captions" => Ok(Self::Captions),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown table '{}' (expected items, captions or all)",
                other
            )),
        }
    }
}

/// Counts and files written by an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub items: usize,
    pub captions: usize,
    pub files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct FullExport<'a> {
    items: &'a [ItemRecord],
    captions: &'a [CaptionTrack],
}

/// Exports the selected tables of `store` to `path`
pub fn export(
    store: &dyn Store,
    format: ExportFormat,
    table: ExportTable,
    path: &Path,
) -> Result<ExportSummary, OutputError> {
    let items = match table {
        ExportTable::Items | ExportTable::All => store.list_items()?,
        ExportTable::Captions => Vec::new(),
    };
    let captions = match table {
        ExportTable::Captions | ExportTable::All => store.list_captions()?,
        ExportTable::Items => Vec::new(),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut files = vec![path.to_path_buf()];
    match (format, table) {
        (ExportFormat::Json, ExportTable::Items) => write_json(create(path)?, &items)?,
        (ExportFormat::Json, ExportTable::Captions) => write_json(create(path)?, &captions)?,
        (ExportFormat::Json, ExportTable::All) => write_json(
            create(path)?,
            &FullExport {
                items: &items,
                captions: &captions,
            },
        )?,
        (ExportFormat::Csv, ExportTable::Items) => write_csv(create(path)?, &items)?,
        (ExportFormat::Csv, ExportTable::Captions) => write_csv(create(path)?, &captions)?,
        (ExportFormat::Csv, ExportTable::All) => {
            let captions_path = sibling_captions_path(path);
            write_csv(create(path)?, &items)?;
            write_csv(create(&captions_path)?, &captions)?;
            files.push(captions_path);
        }
    }

    tracing::info!(
        "Exported {} items and {} captions to {}",
        items.len(),
        captions.len(),
        path.display()
    );

    Ok(ExportSummary {
        items: items.len(),
        captions: captions.len(),
        files,
    })
}

fn create(path: &Path) -> Result<BufWriter<File>, OutputError> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Writes `value` as pretty-printed JSON
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> Result<(), OutputError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes one CSV row per record, with a header row
pub fn write_csv<W: Write, T: Serialize>(writer: W, records: &[T]) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn sibling_captions_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".to_string());
    path.with_file_name(format!("{}_captions.csv", stem))
}
