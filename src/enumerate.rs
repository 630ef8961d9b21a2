use std::thread;

use serde::Serialize;
use tracing::{info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::ResolvedConfig;
use crate::error::KiraError;
use crate::snpedia::{ListingClient, parse_listing_page};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    EndOfData,
    EmptyPage,
    Aborted { message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumerateSummary {
    pub pages: usize,
    pub written: usize,
    pub discarded: usize,
    pub stop: StopReason,
    pub output_path: String,
}

/// Pages through the configured category and appends every matching title
/// to the identifier file. Remote failures end the run with
/// `StopReason::Aborted`; only local write failures are returned as `Err`.
pub fn enumerate_identifiers<C: ListingClient + ?Sized>(
    client: &C,
    config: &ResolvedConfig,
    store: &Store,
    sink: &dyn ProgressSink,
) -> Result<EnumerateSummary, KiraError> {
    let path = store.identifiers_path();
    let mut output = Store::open_append(path)?;
    let mut continuation: Option<String> = None;
    let mut pages = 0usize;
    let mut written = 0usize;
    let mut discarded = 0usize;

    let stop = loop {
        let page = client
            .list_members(&config.category, config.page_size, continuation.as_deref())
            .and_then(|raw| parse_listing_page(&raw));
        let page = match page {
            Ok(page) => page,
            Err(err) => {
                warn!(pages, written, "enumeration aborted: {err}");
                break StopReason::Aborted {
                    message: err.to_string(),
                };
            }
        };

        if page.titles.is_empty() {
            info!("no results returned, stopping");
            break StopReason::EmptyPage;
        }

        for title in &page.titles {
            if config.identifier_pattern.is_match(title) {
                Store::append_line(&mut output, title)?;
                written += 1;
            } else {
                discarded += 1;
            }
        }
        Store::flush(&mut output)?;
        pages += 1;
        sink.event(ProgressEvent {
            message: format!("phase=Enumerate; page {pages}, {written} identifiers"),
            elapsed: None,
        });

        match page.continuation {
            Some(token) => continuation = Some(token),
            None => {
                info!("reached end of category listing");
                break StopReason::EndOfData;
            }
        }

        if !config.listing_delay.is_zero() {
            thread::sleep(config.listing_delay);
        }
    };

    Ok(EnumerateSummary {
        pages,
        written,
        discarded,
        stop,
        output_path: path.to_string(),
    })
}
