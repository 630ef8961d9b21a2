use std::collections::HashSet;
use std::io::BufRead;
use std::thread;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::ResolvedConfig;
use crate::domain::Record;
use crate::error::KiraError;
use crate::snpedia::{AskClient, ask_query, extract_record};
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct FetchSummary {
    pub identifiers: usize,
    pub already_present: usize,
    pub fetched: usize,
    pub failed: usize,
    pub output_path: String,
}

/// Titles already recorded in the stream, by exact `title` match.
pub fn load_processed_titles(store: &Store) -> Result<HashSet<String>, KiraError> {
    let path = store.records_path();
    let mut titles = HashSet::new();
    let Some(reader) = Store::open_reader(path)? else {
        return Ok(titles);
    };
    for (index, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes.map_err(|err| KiraError::Filesystem(format!("read {path}: {err}")))?;
        if bytes.trim_ascii().is_empty() {
            continue;
        }
        let title = std::str::from_utf8(&bytes)
            .ok()
            .and_then(|line| serde_json::from_str::<Value>(line).ok())
            .and_then(|value| value.get("title").and_then(Value::as_str).map(str::to_string));
        match title {
            Some(title) => {
                titles.insert(title);
            }
            None => warn!(line = index + 1, "unreadable record in {path}, ignoring"),
        }
    }
    Ok(titles)
}

pub fn fetch_record<C: AskClient + ?Sized>(
    client: &C,
    config: &ResolvedConfig,
    title: &str,
) -> Result<Record, KiraError> {
    let raw = client.ask(&ask_query(title, &config.attributes))?;
    extract_record(title, &raw, &config.attributes)
}

/// Fetches a record for every identifier not yet in the record stream,
/// appending and flushing one line per record. Per-identifier failures are
/// logged and counted; local write failures end the run.
pub fn fetch_records<C: AskClient + ?Sized>(
    client: &C,
    config: &ResolvedConfig,
    store: &Store,
    sink: &dyn ProgressSink,
) -> Result<FetchSummary, KiraError> {
    if !store.identifiers_path().as_std_path().exists() {
        warn!(
            path = %store.identifiers_path(),
            "identifier list not found, run enumerate first"
        );
        return Ok(FetchSummary {
            identifiers: 0,
            already_present: 0,
            fetched: 0,
            failed: 0,
            output_path: store.records_path().to_string(),
        });
    }
    let identifiers = Store::read_lines(store.identifiers_path())?;
    let mut processed = load_processed_titles(store)?;
    let mut output = Store::open_append(store.records_path())?;

    let total = identifiers.len();
    let mut already_present = 0usize;
    let mut fetched = 0usize;
    let mut failed = 0usize;

    for (index, title) in identifiers.iter().enumerate() {
        if processed.contains(title) {
            already_present += 1;
            continue;
        }

        match fetch_record(client, config, title) {
            Ok(record) => {
                let line = serde_json::to_string(&record)
                    .map_err(|err| KiraError::Filesystem(err.to_string()))?;
                Store::append_line(&mut output, &line)?;
                Store::flush(&mut output)?;
                processed.insert(title.clone());
                fetched += 1;
                debug!(%title, "record stored");
            }
            Err(err) => {
                warn!(%title, "error fetching: {err}");
                failed += 1;
            }
        }

        sink.event(ProgressEvent {
            message: format!("phase=Fetch; {}/{total} {title}", index + 1),
            elapsed: None,
        });

        if !config.fetch_delay.is_zero() {
            thread::sleep(config.fetch_delay);
        }
    }

    Ok(FetchSummary {
        identifiers: total,
        already_present,
        fetched,
        failed,
        output_path: store.records_path().to_string(),
    })
}
