use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};

use camino::Utf8Path;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::dna::{Match, match_calls, read_calls};
use crate::enumerate::{EnumerateSummary, enumerate_identifiers};
use crate::error::KiraError;
use crate::fetch::{FetchSummary, fetch_records};
use crate::fold::{FoldSummary, fold_records};
use crate::lookup::{Lookup, RsidInfo};
use crate::snpedia::{AskClient, ListingClient};
use crate::store::Store;

/// Stage result wrapped with wall-clock bounds.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult<T> {
    pub stage: &'static str,
    pub started_at: String,
    pub finished_at: String,
    #[serde(flatten)]
    pub summary: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct PackageResult {
    pub source_path: String,
    pub archive_path: String,
    pub entry_name: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub calls: usize,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub enumerate: StageResult<EnumerateSummary>,
    pub fetch: StageResult<FetchSummary>,
    pub fold: StageResult<FoldSummary>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C> {
    store: Store,
    config: ResolvedConfig,
    client: C,
}

impl<C> App<C> {
    pub fn new(store: Store, config: ResolvedConfig, client: C) -> Self {
        Self {
            store,
            config,
            client,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn fold(&self, sink: &dyn ProgressSink) -> Result<StageResult<FoldSummary>, KiraError> {
        timed("fold", sink, || fold_records(&self.store, sink))
    }

    /// Zips the by-rsid snapshot for static hosting.
    pub fn package(&self, sink: &dyn ProgressSink) -> Result<PackageResult, KiraError> {
        let source = self.store.by_rsid_path();
        if !source.as_std_path().exists() {
            return Err(KiraError::SnapshotNotFound(source.to_string()));
        }
        sink.event(ProgressEvent {
            message: format!("phase=Store; packaging {source}"),
            elapsed: None,
        });
        let content = Store::read_bytes(source)?;
        let entry_name = source.file_name().unwrap_or(self.config.files.by_rsid.as_str());
        Store::write_zip_atomic(self.store.archive_path(), entry_name, &content)?;
        Ok(PackageResult {
            source_path: source.to_string(),
            archive_path: self.store.archive_path().to_string(),
            entry_name: entry_name.to_string(),
            bytes: content.len(),
        })
    }

    pub fn match_dna(
        &self,
        dna_path: &Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<MatchResult, KiraError> {
        let lookup = self.load_by_rsid()?;
        sink.event(ProgressEvent {
            message: format!("phase=Match; reading {dna_path}"),
            elapsed: None,
        });
        let file = File::open(dna_path.as_std_path())
            .map_err(|err| KiraError::DnaRead(format!("open {dna_path}: {err}")))?;
        let calls = read_calls(BufReader::new(file))?;
        let matches = match_calls(&calls, &lookup);
        Ok(MatchResult {
            calls: calls.len(),
            matches,
        })
    }

    fn load_by_rsid(&self) -> Result<Lookup<RsidInfo>, KiraError> {
        let path = self.store.by_rsid_path();
        let Some(reader) = Store::open_reader(path)? else {
            return Err(KiraError::SnapshotNotFound(path.to_string()));
        };
        serde_json::from_reader(reader).map_err(|err| KiraError::SnapshotParse(err.to_string()))
    }
}

impl<C: ListingClient> App<C> {
    pub fn enumerate(
        &self,
        sink: &dyn ProgressSink,
    ) -> Result<StageResult<EnumerateSummary>, KiraError> {
        timed("enumerate", sink, || {
            enumerate_identifiers(&self.client, &self.config, &self.store, sink)
        })
    }
}

impl<C: AskClient> App<C> {
    pub fn fetch(&self, sink: &dyn ProgressSink) -> Result<StageResult<FetchSummary>, KiraError> {
        timed("fetch", sink, || {
            fetch_records(&self.client, &self.config, &self.store, sink)
        })
    }
}

impl<C: ListingClient + AskClient> App<C> {
    /// Runs enumerate, fetch and fold in order; each stage finishes writing
    /// before the next one reads.
    pub fn run(&self, sink: &dyn ProgressSink) -> Result<PipelineResult, KiraError> {
        let enumerate = self.enumerate(sink)?;
        let fetch = self.fetch(sink)?;
        let fold = self.fold(sink)?;
        Ok(PipelineResult {
            enumerate,
            fetch,
            fold,
        })
    }
}

fn timed<T, F>(
    stage: &'static str,
    sink: &dyn ProgressSink,
    run: F,
) -> Result<StageResult<T>, KiraError>
where
    F: FnOnce() -> Result<T, KiraError>,
{
    let started_at = now();
    let start = Instant::now();
    sink.event(ProgressEvent {
        message: format!("phase=Resolve; starting {stage}"),
        elapsed: None,
    });
    let summary = run()?;
    sink.event(ProgressEvent {
        message: format!("phase=Done; {stage} finished"),
        elapsed: Some(start.elapsed()),
    });
    Ok(StageResult {
        stage,
        started_at,
        finished_at: now(),
        summary,
    })
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
