use std::io::{self, Write};

use serde::Serialize;

use crate::app::{MatchResult, PackageResult, ProgressEvent, ProgressSink, StageResult};
use crate::enumerate::{EnumerateSummary, StopReason};
use crate::fetch::FetchSummary;
use crate::fold::FoldSummary;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

/// Forwards progress to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => {
                tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message)
            }
            None => tracing::info!("{}", event.message),
        }
    }
}

pub struct HumanOutput;

impl HumanOutput {
    pub fn print_enumerate(result: &StageResult<EnumerateSummary>) {
        let summary = &result.summary;
        println!(
            "enumerate: {} pages, {} identifiers appended to {} ({} other titles ignored)",
            summary.pages, summary.written, summary.output_path, summary.discarded
        );
        match &summary.stop {
            StopReason::EndOfData => println!("  reached end of data"),
            StopReason::EmptyPage => println!("  no results returned, stopped"),
            StopReason::Aborted { message } => println!("  stopped early: {message}"),
        }
    }

    pub fn print_fetch(result: &StageResult<FetchSummary>) {
        let summary = &result.summary;
        println!(
            "fetch: {} identifiers, {} already present, {} fetched, {} failed -> {}",
            summary.identifiers,
            summary.already_present,
            summary.fetched,
            summary.failed,
            summary.output_path
        );
    }

    pub fn print_fold(result: &StageResult<FoldSummary>) {
        let summary = &result.summary;
        println!(
            "fold: processed {} rsids and {} genes from {} records ({} lines skipped)",
            summary.rsids, summary.genes, summary.folded, summary.skipped
        );
        let conflicts = summary.rsid_overwrites.conflicts + summary.gene_overwrites.conflicts;
        if conflicts > 0 {
            println!(
                "  {} rsid and {} gene entries were overwritten by conflicting later records",
                summary.rsid_overwrites.conflicts, summary.gene_overwrites.conflicts
            );
        }
        println!("  {}", summary.by_rsid_path);
        println!("  {}", summary.by_gene_path);
    }

    pub fn print_package(result: &PackageResult) {
        println!(
            "package: {} ({} bytes) -> {}",
            result.entry_name, result.bytes, result.archive_path
        );
    }

    pub fn print_match(result: &MatchResult) {
        for item in &result.matches {
            let gene = if item.gene.is_empty() {
                String::new()
            } else {
                format!(" ({})", item.gene)
            };
            println!("{}{gene}", item.rsid);
            if !item.summary.is_empty() {
                println!("  {}", item.summary);
            }
            println!("  repute: {}, magnitude: {}", item.repute, item.magnitude);
        }
        println!(
            "{} matches across {} genotype calls",
            result.matches.len(),
            result.calls
        );
    }
}
