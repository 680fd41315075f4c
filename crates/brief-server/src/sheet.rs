//! Append-only response table stored as CSV.
//!
//! The first row is the header. A record's keys become columns the first time
//! they are seen; older rows are padded with empty cells when the header grows.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use brief_core::export::csv_cell;
use brief_core::{BriefRecord, Field};
use thiserror::Error;
use tracing::info;

/// Separator for multi-value fields inside one cell.
pub const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet I/O failed on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub struct Sheet {
    path: PathBuf,
    header: Vec<String>,
    rows: usize,
}

impl Sheet {
    /// Open an existing sheet or prepare a new one at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SheetError> {
        let path = path.into();
        let mut lines = match fs::read_to_string(&path) {
            Ok(text) => parse_csv(&text).into_iter(),
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new().into_iter(),
            Err(source) => return Err(SheetError::Io { path, source }),
        };
        let header = lines.next().unwrap_or_default();
        Ok(Self {
            path,
            header,
            rows: lines.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    fn io_err(&self) -> impl FnOnce(std::io::Error) -> SheetError + '_ {
        move |source| SheetError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Every data row, header excluded.
    pub fn rows(&self) -> Result<Vec<Vec<String>>, SheetError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_csv(&text).into_iter().skip(1).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(self.io_err()(source)),
        }
    }

    /// Append one record as a row. Returns the number of data rows afterwards.
    ///
    /// On error the sheet is left as it was, in memory and on disk.
    pub fn append(&mut self, record: &BriefRecord) -> Result<usize, SheetError> {
        let new_keys: Vec<&str> = record
            .iter()
            .map(|(field, _)| field.name())
            .filter(|name| !self.header.iter().any(|h| h.as_str() == *name))
            .collect();
        let added = new_keys.len();
        let mut header = self.header.clone();
        header.extend(new_keys.into_iter().map(str::to_string));

        let row: Vec<String> = header
            .iter()
            .map(|h| {
                Field::from_name(h)
                    .map(|f| record.get(f).join(LIST_SEPARATOR))
                    .unwrap_or_default()
            })
            .collect();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(self.io_err())?;
        }
        if added > 0 || !self.path.exists() {
            let mut rows = self.rows()?;
            if added > 0 {
                info!(added, "extending sheet header");
                for old in &mut rows {
                    old.resize(header.len(), String::new());
                }
            }
            rows.push(row);
            self.rewrite(&header, &rows)?;
            self.rows = rows.len();
            self.header = header;
        } else {
            self.append_line(&row)?;
            self.rows += 1;
        }
        info!(path = %self.path.display(), rows = self.rows, "row appended");
        Ok(self.rows)
    }

    fn rewrite(&self, header: &[String], rows: &[Vec<String>]) -> Result<(), SheetError> {
        let mut text = encode_line(header);
        for row in rows {
            text.push_str(&encode_line(row));
        }
        fs::write(&self.path, text).map_err(self.io_err())
    }

    fn append_line(&self, row: &[String]) -> Result<(), SheetError> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(self.io_err())?;
        file.write_all(encode_line(row).as_bytes())
            .map_err(self.io_err())
    }
}

fn encode_line(cells: &[String]) -> String {
    let mut line = cells.iter().map(|c| csv_cell(c)).collect::<Vec<_>>().join(",");
    line.push('\n');
    line
}

/// Parse CSV with quoted cells, doubled quotes, and newlines inside quotes.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            ('"', false) if cell.is_empty() => quoted = true,
            (',', false) => row.push(std::mem::take(&mut cell)),
            ('\r', false) => {}
            ('\n', false) => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            (c, _) => cell.push(c),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}
