//! Blocking, pull-based CSV reader of actions.

use action_types::{parse_timestamp, Action, ActionKind, SubjectId};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::CsvSourceError;

/// Configuration for the CSV action source.
#[derive(Debug, Clone)]
pub struct CsvSourceConfig {
    /// CSV delimiter character (default: ',')
    pub delimiter: u8,

    /// Replay the file from the top once it is exhausted.
    ///
    /// Only honored for file-backed sources. A pass that yields no valid
    /// action ends the stream.
    pub repeat: bool,
}

impl Default for CsvSourceConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            repeat: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionRow {
    user_id: String,
    action: String,
    #[serde(default)]
    item_id: Option<i64>,
    #[serde(default)]
    price: Option<f64>,
    timestamp: String,
}

impl ActionRow {
    fn into_action(self) -> Result<Action, CsvSourceError> {
        let kind: ActionKind = self
            .action
            .parse()
            .map_err(|e| CsvSourceError::InvalidRow(format!("{e}")))?;
        let timestamp = parse_timestamp(&self.timestamp)
            .map_err(|e| CsvSourceError::InvalidRow(format!("{e}")))?;
        Ok(Action {
            subject: SubjectId::new(self.user_id),
            kind,
            item_id: self.item_id,
            price: self.price,
            timestamp,
        })
    }
}

/// Iterator over the actions of a CSV file.
///
/// Each `next()` blocks on file I/O.
pub struct CsvActionSource {
    reader: csv::Reader<Box<dyn Read + Send>>,
    headers: csv::StringRecord,
    record: csv::StringRecord,
    path: Option<PathBuf>,
    config: CsvSourceConfig,
    rows_this_pass: u64,
    records_read: u64,
    skipped: u64,
    passes: u64,
}

impl CsvActionSource {
    /// Open a CSV file. Fails if the file cannot be opened or has no
    /// readable header row.
    pub fn open(path: impl AsRef<Path>, config: CsvSourceConfig) -> Result<Self, CsvSourceError> {
        let path = path.as_ref().to_path_buf();
        let reader = open_file(&path)?;
        info!("Reading actions from {}", path.display());
        Self::build(reader, Some(path), config)
    }

    /// Read actions from any reader. Repeat mode is not available.
    pub fn from_reader<R>(reader: R, config: CsvSourceConfig) -> Result<Self, CsvSourceError>
    where
        R: Read + Send + 'static,
    {
        if config.repeat {
            warn!("Repeat mode needs a file path; reading the input once");
        }
        Self::build(Box::new(reader), None, config)
    }

    fn build(
        input: Box<dyn Read + Send>,
        path: Option<PathBuf>,
        config: CsvSourceConfig,
    ) -> Result<Self, CsvSourceError> {
        let (reader, headers) = csv_reader(input, config.delimiter)?;
        Ok(Self {
            reader,
            headers,
            record: csv::StringRecord::new(),
            path,
            config,
            rows_this_pass: 0,
            records_read: 0,
            skipped: 0,
            passes: 1,
        })
    }

    /// Valid actions produced so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Rows skipped because they could not be parsed.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Number of passes over the input started so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn current_line(&self) -> u64 {
        self.record.position().map(|p| p.line()).unwrap_or(0)
    }

    fn parse_current(&self) -> Result<Action, CsvSourceError> {
        let row: ActionRow = self.record.deserialize(Some(&self.headers))?;
        row.into_action()
    }

    fn rewind(&mut self) -> Result<bool, CsvSourceError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(false);
        };
        if !self.config.repeat || self.rows_this_pass == 0 {
            return Ok(false);
        }
        let (reader, headers) = csv_reader(open_file(path)?, self.config.delimiter)?;
        self.reader = reader;
        self.headers = headers;
        self.rows_this_pass = 0;
        self.passes += 1;
        debug!("Replaying {} (pass {})", path.display(), self.passes);
        Ok(true)
    }
}

impl Iterator for CsvActionSource {
    type Item = Action;

    fn next(&mut self) -> Option<Action> {
        loop {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => match self.parse_current() {
                    Ok(action) => {
                        self.rows_this_pass += 1;
                        self.records_read += 1;
                        return Some(action);
                    }
                    Err(e) => {
                        self.skipped += 1;
                        warn!(line = self.current_line(), "Skipping malformed action row: {e}");
                    }
                },
                Ok(false) => match self.rewind() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => {
                        warn!("Failed to replay CSV input: {e}");
                        return None;
                    }
                },
                Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                    warn!("Failed to read CSV input: {e}");
                    return None;
                }
                Err(e) => {
                    self.skipped += 1;
                    warn!("Skipping unreadable CSV row: {e}");
                }
            }
        }
    }
}

fn open_file(path: &Path) -> Result<Box<dyn Read + Send>, CsvSourceError> {
    let file = File::open(path).map_err(|source| CsvSourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(BufReader::new(file)))
}

fn csv_reader(
    input: Box<dyn Read + Send>,
    delimiter: u8,
) -> Result<(csv::Reader<Box<dyn Read + Send>>, csv::StringRecord), CsvSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    Ok((reader, headers))
}
