use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tempfile::{Builder, NamedTempFile};
use tracing::warn;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::ResolvedConfig;
use crate::error::KiraError;

/// Locations of every pipeline artifact under one data directory.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
    identifiers: Utf8PathBuf,
    records: Utf8PathBuf,
    by_rsid: Utf8PathBuf,
    by_gene: Utf8PathBuf,
    archive: Utf8PathBuf,
}

impl Store {
    pub fn new(config: &ResolvedConfig) -> Self {
        Self::new_with_root(config.data_dir.clone(), config)
    }

    pub fn new_with_root(root: Utf8PathBuf, config: &ResolvedConfig) -> Self {
        let files = &config.files;
        Self {
            identifiers: root.join(&files.identifiers),
            records: root.join(&files.records),
            by_rsid: root.join(&files.by_rsid),
            by_gene: root.join(&files.by_gene),
            archive: root.join(&files.archive),
            root,
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn identifiers_path(&self) -> &Utf8Path {
        &self.identifiers
    }

    pub fn records_path(&self) -> &Utf8Path {
        &self.records
    }

    pub fn by_rsid_path(&self) -> &Utf8Path {
        &self.by_rsid
    }

    pub fn by_gene_path(&self) -> &Utf8Path {
        &self.by_gene
    }

    pub fn archive_path(&self) -> &Utf8Path {
        &self.archive
    }

    /// Appends to an existing file, creates it otherwise.
    pub fn open_append(path: &Utf8Path) -> Result<File, KiraError> {
        ensure_parent(path)?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("open {path}: {err}")))
    }

    pub fn open_reader(path: &Utf8Path) -> Result<Option<BufReader<File>>, KiraError> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let file = File::open(path.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("open {path}: {err}")))?;
        Ok(Some(BufReader::new(file)))
    }

    /// Trimmed, non-empty lines; a missing file reads as empty. Lines that are
    /// not valid UTF-8 are dropped with a warning.
    pub fn read_lines(path: &Utf8Path) -> Result<Vec<String>, KiraError> {
        let Some(reader) = Self::open_reader(path)? else {
            return Ok(Vec::new());
        };
        let mut lines = Vec::new();
        for (index, bytes) in reader.split(b'\n').enumerate() {
            let bytes =
                bytes.map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                warn!(line = index + 1, "skipping non UTF-8 line in {path}");
                continue;
            };
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed.to_string());
            }
        }
        Ok(lines)
    }

    pub fn append_line(file: &mut File, line: &str) -> Result<(), KiraError> {
        file.write_all(line.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    pub fn flush(file: &mut File) -> Result<(), KiraError> {
        file.flush()
            .map_err(|err| KiraError::Filesystem(err.to_string()))
    }

    /// Pretty JSON snapshot, fully replacing whatever was at `path`.
    pub fn write_json_atomic<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), KiraError> {
        let mut temp = temp_beside(path, "kira-gt-json")?;
        serde_json::to_writer_pretty(temp.as_file_mut(), value)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        temp.as_file_mut()
            .write_all(b"\n")
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        persist(temp, path)
    }

    /// Single-entry deflated zip archive, fully replacing whatever was at `path`.
    pub fn write_zip_atomic(
        path: &Utf8Path,
        entry_name: &str,
        content: &[u8],
    ) -> Result<(), KiraError> {
        let temp = temp_beside(path, "kira-gt-zip")?;
        let mut writer = ZipWriter::new(temp);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        writer
            .start_file(entry_name, options)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        writer
            .write_all(content)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let temp = writer
            .finish()
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        persist(temp, path)
    }

    pub fn read_bytes(path: &Utf8Path) -> Result<Vec<u8>, KiraError> {
        fs::read(path.as_std_path())
            .map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))
    }
}

fn ensure_parent(path: &Utf8Path) -> Result<(), KiraError> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
    }
    Ok(())
}

fn temp_beside(path: &Utf8Path, prefix: &str) -> Result<NamedTempFile, KiraError> {
    ensure_parent(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent.to_path_buf(),
        _ => Utf8PathBuf::from("."),
    };
    Builder::new()
        .prefix(prefix)
        .tempfile_in(dir.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))
}

fn persist(temp: NamedTempFile, path: &Utf8Path) -> Result<(), KiraError> {
    temp.persist(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(format!("persist {path}: {err}")))?;
    Ok(())
}
