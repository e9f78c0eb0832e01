//! CSV persistence for generated topics and the topic vocabulary.
//!
//! Each domain gets one file, `{output_dir}/topic_modeling_{slug}.csv`, with
//! the columns `primary_topics,secondary_topics,source_id`. Topic columns hold
//! list literals such as `['Taproot', 'Schnorr signatures']`. Rows are unique
//! on `source_id`; the first row seen for an id wins.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use curator_core::{
    defaults, format_string_list, parse_string_list, Error, Result, TopicList,
};

use crate::handler::domain_slug;

/// Topics generated for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRow {
    pub primary_topics: Vec<String>,
    pub secondary_topics: Vec<String>,
    /// Empty when the document had no `source_id`.
    pub source_id: String,
}

/// On-disk shape of a [`TopicRow`].
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    primary_topics: String,
    secondary_topics: String,
    #[serde(default)]
    source_id: String,
}

impl TopicRow {
    fn to_record(&self) -> CsvRecord {
        CsvRecord {
            primary_topics: format_string_list(&self.primary_topics),
            secondary_topics: format_string_list(&self.secondary_topics),
            source_id: self.source_id.clone(),
        }
    }

    fn from_record(record: CsvRecord, path: &Path, line: usize) -> Result<Self> {
        let parse = |column: &str, value: &str| -> Result<Vec<String>> {
            if value.trim().is_empty() {
                return Ok(Vec::new());
            }
            parse_string_list(value).map_err(|e| {
                Error::Parse(format!(
                    "{}:{}: bad {} column: {}",
                    path.display(),
                    line,
                    column,
                    e
                ))
            })
        };

        Ok(Self {
            primary_topics: parse("primary_topics", &record.primary_topics)?,
            secondary_topics: parse("secondary_topics", &record.secondary_topics)?,
            source_id: record.source_id.trim().to_string(),
        })
    }
}

fn csv_error(path: &Path, e: csv::Error) -> Error {
    Error::Serialization(format!("{}: {}", path.display(), e))
}

/// Read every row of a topic CSV, in file order, without deduplication.
pub fn read_rows(path: &Path) -> Result<Vec<TopicRow>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<CsvRecord>().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        // header is line 1
        rows.push(TopicRow::from_record(record, path, i + 2)?);
    }
    Ok(rows)
}

/// Topic rows of one domain, unique on `source_id`.
#[derive(Debug, Clone)]
pub struct TopicCsvStore {
    path: PathBuf,
    rows: Vec<TopicRow>,
    positions: HashMap<String, usize>,
}

impl TopicCsvStore {
    /// File holding the rows of `domain` (`None` is all data).
    pub fn path_for(output_dir: &Path, domain: Option<&str>) -> PathBuf {
        output_dir.join(format!("topic_modeling_{}.csv", domain_slug(domain)))
    }

    /// Default location of the store for `domain`.
    pub fn default_path(domain: Option<&str>) -> PathBuf {
        Self::path_for(Path::new(defaults::OUTPUT_DIR), domain)
    }

    /// Empty store that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rows: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Load the store at `path`, or start an empty one when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            Self::load(path)
        } else {
            info!(
                subsystem = "jobs",
                component = "topic_store",
                path = %path.display(),
                "CSV file does not exist, starting a new one"
            );
            Ok(Self::new(path))
        }
    }

    /// Load an existing store. Fails with `NotFound` when the file is missing.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "No topic CSV at {}",
                path.display()
            )));
        }
        let mut store = Self::new(path);
        for row in read_rows(&store.path)? {
            store.insert(row);
        }
        info!(
            subsystem = "jobs",
            component = "topic_store",
            path = %store.path.display(),
            rows = store.len(),
            "Loaded topic CSV"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[TopicRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.positions.contains_key(source_id)
    }

    pub fn get(&self, source_id: &str) -> Option<&TopicRow> {
        self.positions.get(source_id).map(|&i| &self.rows[i])
    }

    /// Add a row unless its `source_id` is already stored. Returns whether it
    /// was added.
    pub fn insert(&mut self, row: TopicRow) -> bool {
        if self.positions.contains_key(&row.source_id) {
            return false;
        }
        self.positions.insert(row.source_id.clone(), self.rows.len());
        self.rows.push(row);
        true
    }

    /// Write the store to its path, replacing the previous file atomically.
    pub fn save(&self) -> Result<()> {
        write_rows(&self.path, &self.rows)?;
        debug!(
            subsystem = "jobs",
            component = "topic_store",
            path = %self.path.display(),
            rows = self.rows.len(),
            "CSV file saved"
        );
        Ok(())
    }
}

fn write_rows(path: &Path, rows: &[TopicRow]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        if rows.is_empty() {
            writer
                .write_record(["primary_topics", "secondary_topics", "source_id"])
                .map_err(|e| csv_error(path, e))?;
        }
        for row in rows {
            writer
                .serialize(row.to_record())
                .map_err(|e| csv_error(path, e))?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Merge every `*.csv` file in `dir` into `out`, keeping the first row per
/// `source_id`. Files are read in name order; `out` itself is never read.
/// Returns the number of rows written.
pub fn merge_csv_dir(dir: &Path, out: &Path) -> Result<usize> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .filter(|p| !same_file(p, out))
        .collect();
    files.sort();

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for file in &files {
        let rows = read_rows(file)?;
        debug!(
            subsystem = "jobs",
            component = "topic_store",
            path = %file.display(),
            rows = rows.len(),
            "Merging CSV file"
        );
        for row in rows {
            if seen.insert(row.source_id.clone()) {
                merged.push(row);
            }
        }
    }

    write_rows(out, &merged)?;
    info!(
        subsystem = "jobs",
        component = "topic_store",
        files = files.len(),
        rows = merged.len(),
        out = %out.display(),
        "Merged CSV files"
    );
    Ok(merged.len())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Read the controlled vocabulary from the `Topics` column of a CSV file.
///
/// Blank cells are ignored; order is preserved.
pub fn load_topic_list(path: &Path) -> Result<TopicList> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;
    let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    let column = headers
        .iter()
        .position(|h| h.trim() == defaults::TOPICS_COLUMN)
        .ok_or_else(|| {
            Error::Config(format!(
                "{} has no '{}' column",
                path.display(),
                defaults::TOPICS_COLUMN
            ))
        })?;

    let mut topics = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        if let Some(topic) = record.get(column).map(str::trim).filter(|t| !t.is_empty()) {
            topics.push(topic.to_string());
        }
    }

    info!(
        subsystem = "jobs",
        component = "topic_store",
        path = %path.display(),
        topics = topics.len(),
        "Loaded topic vocabulary"
    );
    Ok(TopicList::new(topics))
}
