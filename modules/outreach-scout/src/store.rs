//! Shard persistence: one CSV file per (city, partner type).
//!
//! Layout: `<root>/<city_slug>/<partner_type>/contacts.csv`. Writes go to a
//! temp file in the target directory and are renamed into place, so a shard
//! either exists in full or not at all.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use outreach_common::{ContactRecord, OutreachError, PartnerType, ShardKey, CSV_HEADER};

pub const SHARD_FILE: &str = "contacts.csv";

pub trait ShardStore: Send + Sync {
    fn exists(&self, key: &ShardKey) -> bool;

    fn read(&self, key: &ShardKey) -> Result<Vec<ContactRecord>, OutreachError>;

    /// Read a shard that is about to be rewritten. Fails when rewriting the
    /// returned records would not reproduce every row on disk.
    fn read_for_rewrite(&self, key: &ShardKey) -> Result<Vec<ContactRecord>, OutreachError> {
        self.read(key)
    }

    /// Persist a shard. All-or-nothing: a failed write leaves no file behind.
    fn write(&self, key: &ShardKey, records: &[ContactRecord]) -> Result<(), OutreachError>;

    /// Every materialized shard, sorted by city slug then partner type.
    fn keys(&self) -> Result<Vec<ShardKey>, OutreachError>;
}

// ---------------------------------------------------------------------------
// FsShardStore
// ---------------------------------------------------------------------------

pub struct FsShardStore {
    root: PathBuf,
}

impl FsShardStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shard_path(&self, key: &ShardKey) -> PathBuf {
        self.root
            .join(&key.city_slug)
            .join(key.partner_type.as_str())
            .join(SHARD_FILE)
    }
}

impl ShardStore for FsShardStore {
    fn exists(&self, key: &ShardKey) -> bool {
        self.shard_path(key).is_file()
    }

    fn read(&self, key: &ShardKey) -> Result<Vec<ContactRecord>, OutreachError> {
        read_contacts(&self.shard_path(key))
    }

    fn read_for_rewrite(&self, key: &ShardKey) -> Result<Vec<ContactRecord>, OutreachError> {
        read_contacts_file(&self.shard_path(key))?.into_rewritable()
    }

    fn write(&self, key: &ShardKey, records: &[ContactRecord]) -> Result<(), OutreachError> {
        write_contacts(&self.shard_path(key), records)
    }

    fn keys(&self) -> Result<Vec<ShardKey>, OutreachError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| OutreachError::persistence(&self.root, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OutreachError::persistence(&self.root, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(city_slug) = entry.file_name().to_str().map(str::to_string) else {
                warn!(path = %entry.path().display(), "Skipping non UTF-8 city directory");
                continue;
            };
            for partner_type in PartnerType::ALL {
                let key = ShardKey::new(city_slug.clone(), partner_type);
                if self.exists(&key) {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

// ---------------------------------------------------------------------------
// CSV files
// ---------------------------------------------------------------------------

/// A contacts file as read from disk.
#[derive(Debug, Default)]
pub struct ContactsFile {
    pub path: PathBuf,
    pub records: Vec<ContactRecord>,
    /// Rows that were skipped or read with something dropped (an unknown
    /// `type`, extra columns). Writing `records` back would lose them.
    pub lossy_rows: usize,
}

impl ContactsFile {
    /// The records, provided writing them back loses nothing.
    pub fn into_rewritable(self) -> Result<Vec<ContactRecord>, OutreachError> {
        if self.lossy_rows > 0 {
            return Err(OutreachError::persistence(
                &self.path,
                format!(
                    "{} row(s) could not be read back exactly; refusing to rewrite",
                    self.lossy_rows
                ),
            ));
        }
        Ok(self.records)
    }
}

/// Read a contacts file, keeping every row that can be read at all.
pub fn read_contacts(path: &Path) -> Result<Vec<ContactRecord>, OutreachError> {
    Ok(read_contacts_file(path)?.records)
}

/// Read a contacts file and count the rows that would not survive a rewrite.
///
/// Short rows are padded with empty columns, type names are matched
/// case-insensitively and a blank or unknown type reads as `other`.
pub fn read_contacts_file(path: &Path) -> Result<ContactsFile, OutreachError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| OutreachError::persistence(path, e))?;
    let headers = reader
        .headers()
        .map_err(|e| OutreachError::persistence(path, e))?
        .clone();
    let type_column = headers.iter().position(|h| h.trim() == "type");

    let mut file = ContactsFile {
        path: path.to_path_buf(),
        ..Default::default()
    };
    for row in reader.records() {
        let mut row = match row {
            Ok(row) => row,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                warn!(path = %path.display(), line, error = %e, "Skipping unreadable contact row");
                file.lossy_rows += 1;
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let mut lossy = false;

        if row.len() > headers.len() {
            warn!(path = %path.display(), line, columns = row.len(), "Contact row has extra columns");
            lossy = true;
        }
        while row.len() < headers.len() {
            row.push_field("");
        }

        let raw_type = type_column.and_then(|i| row.get(i)).unwrap_or("").trim();
        if !raw_type.is_empty() && raw_type.parse::<PartnerType>().is_err() {
            warn!(path = %path.display(), line, partner_type = raw_type, "Unknown partner type read as other");
            lossy = true;
        }

        match row.deserialize::<ContactRecord>(Some(&headers)) {
            Ok(record) => file.records.push(record),
            Err(e) => {
                warn!(path = %path.display(), line, error = %e, "Skipping malformed contact row");
                lossy = true;
            }
        }
        if lossy {
            file.lossy_rows += 1;
        }
    }
    Ok(file)
}

/// Write a contacts file with a header row, replacing any existing file
/// atomically.
pub fn write_contacts(path: &Path, records: &[ContactRecord]) -> Result<(), OutreachError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| OutreachError::persistence(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| OutreachError::persistence(dir, e))?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(tmp.as_file_mut());
        writer
            .write_record(CSV_HEADER)
            .map_err(|e| OutreachError::persistence(path, e))?;
        for record in records {
            writer
                .serialize(record)
                .map_err(|e| OutreachError::persistence(path, e))?;
        }
        writer.flush().map_err(|e| OutreachError::persistence(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| OutreachError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| OutreachError::persistence(path, e.error))?;
    Ok(())
}
