use std::io::BufRead;

use serde::Serialize;
use serde_json::Number;
use tracing::warn;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{AllelePair, Record, normalize_identifier};
use crate::error::KiraError;
use crate::lookup::{GeneInfo, InsertOutcome, Lookup, RsidInfo};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Blank,
    Malformed(String),
    MissingTitle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Record(Box<Record>),
    Skip(SkipReason),
}

pub fn classify_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Skip(SkipReason::Blank);
    }
    match serde_json::from_str::<Record>(line) {
        Ok(record) if normalize_identifier(&record.title).is_empty() => {
            LineOutcome::Skip(SkipReason::MissingTitle)
        }
        Ok(record) => LineOutcome::Record(Box::new(record)),
        Err(err) => LineOutcome::Skip(SkipReason::Malformed(err.to_string())),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverwriteCounts {
    pub duplicates: usize,
    pub conflicts: usize,
}

impl OverwriteCounts {
    fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::New => {}
            InsertOutcome::Duplicate => self.duplicates += 1,
            InsertOutcome::Conflict => self.conflicts += 1,
        }
    }
}

/// Both lookups built from one pass over the record stream.
#[derive(Debug, Default)]
pub struct GenotypeIndex {
    pub by_rsid: Lookup<RsidInfo>,
    pub by_gene: Lookup<GeneInfo>,
    pub rsid_overwrites: OverwriteCounts,
    pub gene_overwrites: OverwriteCounts,
}

impl GenotypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold_record(&mut self, record: &Record) {
        let rsid = normalize_identifier(&record.title);
        let pair = AllelePair::new(record.allele1.as_deref(), record.allele2.as_deref());
        let gene = record.gene.clone().unwrap_or_default();
        let summary = record.summary.clone().unwrap_or_default();
        let repute = record.repute.clone().unwrap_or_default();
        let magnitude = record.magnitude.clone().unwrap_or_else(|| Number::from(0));

        if !gene.is_empty() {
            let outcome = self.by_gene.insert(
                &gene,
                &pair,
                GeneInfo {
                    rsid: rsid.clone(),
                    summary: summary.clone(),
                    magnitude: magnitude.clone(),
                    repute: repute.clone(),
                },
            );
            self.gene_overwrites.record(outcome);
        }

        let outcome = self.by_rsid.insert(
            &rsid,
            &pair,
            RsidInfo {
                gene,
                summary,
                magnitude,
                repute,
            },
        );
        self.rsid_overwrites.record(outcome);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FoldSummary {
    pub lines: usize,
    pub folded: usize,
    pub skipped: usize,
    pub rsids: usize,
    pub genes: usize,
    pub rsid_overwrites: OverwriteCounts,
    pub gene_overwrites: OverwriteCounts,
    pub by_rsid_path: String,
    pub by_gene_path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub lines: usize,
    pub folded: usize,
    pub skipped: usize,
}

/// Folds every line of `reader` into a fresh index. Blank lines are neither
/// folded nor counted as skipped. Lines that are not valid UTF-8 (a torn
/// write) are skipped like any other malformed line.
pub fn fold_lines<R: BufRead>(reader: R) -> Result<(GenotypeIndex, LineCounts), KiraError> {
    let mut index = GenotypeIndex::new();
    let mut counts = LineCounts::default();
    for bytes in reader.split(b'\n') {
        let bytes = bytes.map_err(|err| KiraError::Filesystem(err.to_string()))?;
        counts.lines += 1;
        let outcome = match std::str::from_utf8(&bytes) {
            Ok(line) => classify_line(line),
            Err(err) => LineOutcome::Skip(SkipReason::Malformed(err.to_string())),
        };
        match outcome {
            LineOutcome::Record(record) => {
                index.fold_record(&record);
                counts.folded += 1;
            }
            LineOutcome::Skip(SkipReason::Blank) => {}
            LineOutcome::Skip(reason) => {
                counts.skipped += 1;
                let content = String::from_utf8_lossy(&bytes);
                warn!(
                    line = counts.lines,
                    ?reason,
                    content = %content.trim_end(),
                    "skipping record line"
                );
            }
        }
    }
    Ok((index, counts))
}

/// Rebuilds both lookups from the full record stream and overwrites the
/// snapshot files.
pub fn fold_records(store: &Store, sink: &dyn ProgressSink) -> Result<FoldSummary, KiraError> {
    let path = store.records_path();
    let reader = Store::open_reader(path)?
        .ok_or_else(|| KiraError::Filesystem(format!("record stream not found: {path}")))?;

    sink.event(ProgressEvent {
        message: format!("phase=Fold; reading {path}"),
        elapsed: None,
    });
    let (index, counts) = fold_lines(reader)?;

    if index.rsid_overwrites.conflicts + index.gene_overwrites.conflicts > 0 {
        warn!(
            rsid_conflicts = index.rsid_overwrites.conflicts,
            gene_conflicts = index.gene_overwrites.conflicts,
            "conflicting records for the same allele pair, later lines won"
        );
    }

    sink.event(ProgressEvent {
        message: "phase=Store; writing lookup snapshots".to_string(),
        elapsed: None,
    });
    Store::write_json_atomic(store.by_rsid_path(), &index.by_rsid)?;
    Store::write_json_atomic(store.by_gene_path(), &index.by_gene)?;

    Ok(FoldSummary {
        lines: counts.lines,
        folded: counts.folded,
        skipped: counts.skipped,
        rsids: index.by_rsid.len(),
        genes: index.by_gene.len(),
        rsid_overwrites: index.rsid_overwrites,
        gene_overwrites: index.gene_overwrites,
        by_rsid_path: store.by_rsid_path().to_string(),
        by_gene_path: store.by_gene_path().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn classify_branches_on_line_shape() {
        assert_eq!(classify_line("   "), LineOutcome::Skip(SkipReason::Blank));
        assert_matches!(
            classify_line("{not json"),
            LineOutcome::Skip(SkipReason::Malformed(_))
        );
        assert_matches!(
            classify_line(r#"{"allele1":"A"}"#),
            LineOutcome::Skip(SkipReason::Malformed(_))
        );
        assert_eq!(
            classify_line(r#"{"title":" (1)"}"#),
            LineOutcome::Skip(SkipReason::MissingTitle)
        );
        assert_matches!(classify_line(r#"{"title":"Rs1"}"#), LineOutcome::Record(_));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let mut index = GenotypeIndex::new();
        index.fold_record(&Record::titled("Rs42(C;T)"));
        let info = index.by_rsid.get("rs42", &AllelePair::new(None, None)).unwrap();
        assert_eq!(info.gene, "");
        assert_eq!(info.summary, "");
        assert_eq!(info.repute, "");
        assert_eq!(info.magnitude, Number::from(0));
        assert!(index.by_gene.is_empty());
    }

    #[test]
    fn blank_lines_are_not_skips() {
        let input = "\n{\"title\":\"Rs1\"}\n\n";
        let (_, counts) = fold_lines(input.as_bytes()).unwrap();
        assert_eq!(counts.folded, 1);
        assert_eq!(counts.skipped, 0);
    }

    #[test]
    fn invalid_utf8_counts_as_malformed() {
        let input: &[u8] = b"{\"title\":\"Rs1\"}\n\xc3(\n{\"title\":\"Rs2\"}\n";
        let (index, counts) = fold_lines(input).unwrap();
        assert_eq!(counts.lines, 3);
        assert_eq!(counts.folded, 2);
        assert_eq!(counts.skipped, 1);
        assert_eq!(index.by_rsid.len(), 2);
    }
}
