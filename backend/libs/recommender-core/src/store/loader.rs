//! Line-oriented rating file loader
//!
//! Record layout: `userID,itemID,rating[,timestamp]`, comma or tab separated,
//! no header. Lines starting with `#` and blank lines are ignored.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::{Rating, RatingStore};
use crate::error::{RecommenderError, Result};

/// What to do when a (user, item) pair appears more than once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last record wins
    #[default]
    Overwrite,
    /// A repeated pair fails the load
    Reject,
}

/// What to do with a record that cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// The whole load fails on the first bad record
    #[default]
    Fail,
    /// The record is logged, counted and skipped
    Skip,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!(
                "unknown duplicate policy '{}', expected overwrite or reject",
                other
            )),
        }
    }
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(MalformedPolicy::Fail),
            "skip" => Ok(MalformedPolicy::Skip),
            other => Err(format!(
                "unknown malformed-record policy '{}', expected fail or skip",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
    #[serde(default)]
    pub malformed: MalformedPolicy,
}

/// Counters collected while loading a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub records: usize,
    pub comments: usize,
    pub blank_lines: usize,
    pub skipped: usize,
    pub overwritten: usize,
}

impl RatingStore {
    /// Load a store from a rating file on disk
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<(Self, LoadStats)> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RecommenderError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        let (store, stats) = read_ratings(BufReader::new(file), path, options)?;

        info!(
            path = %path.display(),
            records = stats.records,
            skipped = stats.skipped,
            overwritten = stats.overwritten,
            users = store.metadata().user_count,
            items = store.metadata().item_count,
            "Rating store loaded"
        );

        Ok((store, stats))
    }

    /// Load a store from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R, options: &LoadOptions) -> Result<(Self, LoadStats)> {
        read_ratings(reader, Path::new("<reader>"), options)
    }
}

fn read_ratings<R: BufRead>(
    mut reader: R,
    source_path: &Path,
    options: &LoadOptions,
) -> Result<(RatingStore, LoadStats)> {
    let mut store = RatingStore::new();
    let mut stats = LoadStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| RecommenderError::SourceUnavailable {
                path: source_path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        // Undecodable bytes make the record malformed, not the source unavailable
        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    stats.blank_lines += 1;
                    continue;
                }
                if trimmed.starts_with('#') {
                    stats.comments += 1;
                    continue;
                }
                parse_record(trimmed)
            }
            Err(e) => Err(format!("record is not valid UTF-8: {}", e)),
        };

        let rating = match parsed {
            Ok(rating) => rating,
            Err(reason) => match options.malformed {
                MalformedPolicy::Fail => {
                    return Err(RecommenderError::data_format(line_no, reason));
                }
                MalformedPolicy::Skip => {
                    warn!(line = line_no, reason = %reason, "Skipping malformed rating record");
                    stats.skipped += 1;
                    continue;
                }
            },
        };

        if options.duplicates == DuplicatePolicy::Reject
            && store.contains(rating.user_id, rating.item_id)
        {
            return Err(RecommenderError::data_format(
                line_no,
                format!(
                    "duplicate rating for user {} and item {}",
                    rating.user_id, rating.item_id
                ),
            ));
        }

        if store.insert_unchecked(rating).is_some() {
            debug!(
                line = line_no,
                user_id = rating.user_id,
                item_id = rating.item_id,
                "Duplicate rating overwritten"
            );
            stats.overwritten += 1;
        }
        stats.records += 1;
    }

    Ok((store, stats))
}

/// Parse one non-comment record
fn parse_record(line: &str) -> std::result::Result<Rating, String> {
    let fields: Vec<&str> = line.split([',', '\t']).map(str::trim).collect();

    if fields.len() < 3 {
        return Err(format!(
            "expected userID,itemID,rating[,timestamp], found {} field(s)",
            fields.len()
        ));
    }
    if fields.len() > 4 {
        return Err(format!("too many fields: {}", fields.len()));
    }

    let user_id = fields[0]
        .parse::<i64>()
        .map_err(|e| format!("invalid user id '{}': {}", fields[0], e))?;
    let item_id = fields[1]
        .parse::<i64>()
        .map_err(|e| format!("invalid item id '{}': {}", fields[1], e))?;
    if fields[2].is_empty() {
        return Err("missing rating value".to_string());
    }
    let value = fields[2]
        .parse::<f64>()
        .map_err(|e| format!("invalid rating '{}': {}", fields[2], e))?;

    if let Some(timestamp) = fields.get(3) {
        timestamp
            .parse::<i64>()
            .map_err(|e| format!("invalid timestamp '{}': {}", timestamp, e))?;
    }

    let rating = Rating::new(user_id, item_id, value);
    rating.validate()?;
    Ok(rating)
}
