use crate::types::{BotError, Result};
use chrono::{Local, NaiveDateTime};
use interfaces::{Action, Classification, Headline};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SIGNAL_LOG_HEADER: [&str; 8] = [
    "Time",
    "Headline",
    "MarketRelevant",
    "Category",
    "Sentiment",
    "Confidence",
    "Action",
    "Explanation",
];

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One processed headline. Missing classification fields are empty cells.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub time: NaiveDateTime,
    pub headline: String,
    pub market_relevant: Option<String>,
    pub category: Option<String>,
    pub sentiment: Option<String>,
    pub confidence: Option<String>,
    pub action: String,
    pub explanation: Option<String>,
}

impl SignalRecord {
    pub fn new(
        time: NaiveDateTime,
        headline: &Headline,
        classification: &Classification,
        action: &Action,
    ) -> Self {
        let field = |value: Option<&str>| value.map(str::to_string);
        Self {
            time,
            headline: headline.to_string(),
            market_relevant: field(classification.market_relevant()),
            category: field(classification.category()),
            sentiment: field(classification.sentiment()),
            confidence: field(classification.confidence()),
            action: action.to_string(),
            explanation: field(classification.explanation()),
        }
    }

    /// Stamped with the local wall-clock time
    pub fn now(headline: &Headline, classification: &Classification, action: &Action) -> Self {
        Self::new(Local::now().naive_local(), headline, classification, action)
    }

    fn to_row(&self) -> [String; 8] {
        let cell = |value: &Option<String>| value.clone().unwrap_or_default();
        [
            self.time.format(TIME_FORMAT).to_string(),
            self.headline.clone(),
            cell(&self.market_relevant),
            cell(&self.category),
            cell(&self.sentiment),
            cell(&self.confidence),
            self.action.clone(),
            cell(&self.explanation),
        ]
    }

    fn from_row(row: &csv::StringRecord) -> Result<Self> {
        if row.len() != SIGNAL_LOG_HEADER.len() {
            return Err(BotError::InvalidRecord(format!(
                "expected {} columns, found {}",
                SIGNAL_LOG_HEADER.len(),
                row.len()
            )));
        }

        let time = NaiveDateTime::parse_from_str(&row[0], TIME_FORMAT)
            .map_err(|e| BotError::InvalidRecord(format!("bad time {:?}: {}", &row[0], e)))?;
        let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

        Ok(Self {
            time,
            headline: row[1].to_string(),
            market_relevant: optional(&row[2]),
            category: optional(&row[3]),
            sentiment: optional(&row[4]),
            confidence: optional(&row[5]),
            action: row[6].to_string(),
            explanation: optional(&row[7]),
        })
    }
}

/// Append-only CSV signal log
#[derive(Debug, Clone)]
pub struct SignalLog {
    path: PathBuf,
}

impl SignalLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, writing the header first when the file is new or empty.
    /// The row is flushed before returning.
    pub fn append(&self, record: &SignalRecord) -> Result<()> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(metadata) => metadata.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            debug!("Creating signal log {}", self.path.display());
            writer.write_record(SIGNAL_LOG_HEADER)?;
        }
        writer.write_record(record.to_row())?;
        writer.flush()?;

        Ok(())
    }

    /// Reads every row back. A missing log has no records.
    pub fn load_records(&self) -> Result<Vec<SignalRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for row in reader.records() {
            records.push(SignalRecord::from_row(&row?)?);
        }
        Ok(records)
    }
}
