#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use serde_json::{Value, json};

use kira_genotypes::app::{ProgressEvent, ProgressSink};
use kira_genotypes::config::{Config, ConfigLoader, ResolvedConfig};
use kira_genotypes::error::KiraError;
use kira_genotypes::snpedia::{AskClient, ListingClient};
use kira_genotypes::store::Store;

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Config with no politeness delays, rooted in a temp dir.
pub fn test_store() -> (tempfile::TempDir, ResolvedConfig, Store) {
    let temp = tempfile::tempdir().unwrap();
    let config = Config {
        listing_delay_ms: Some(0),
        fetch_delay_ms: Some(0),
        data_dir: Some(temp.path().to_str().unwrap().to_string()),
        ..Config::default()
    };
    let resolved = ConfigLoader::resolve_config(config).unwrap();
    let store = Store::new(&resolved);
    (temp, resolved, store)
}

pub fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

/// Listing pages served in order, ask responses served by title.
#[derive(Default)]
pub struct MockSnpedia {
    pages: Mutex<Vec<Result<Value, KiraError>>>,
    pub continuations: Mutex<Vec<Option<String>>>,
    answers: HashMap<String, Value>,
    pub asked: Mutex<Vec<String>>,
}

impl MockSnpedia {
    pub fn new(pages: Vec<Result<Value, KiraError>>, answers: Vec<(&str, Value)>) -> Self {
        let mut pages = pages;
        pages.reverse();
        Self {
            pages: Mutex::new(pages),
            continuations: Mutex::new(Vec::new()),
            answers: answers
                .into_iter()
                .map(|(title, value)| (title.to_string(), value))
                .collect(),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pages(pages: Vec<Result<Value, KiraError>>) -> Self {
        Self::new(pages, Vec::new())
    }

    pub fn with_answers(answers: Vec<(&str, Value)>) -> Self {
        Self::new(Vec::new(), answers)
    }

    pub fn asked_titles(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl ListingClient for MockSnpedia {
    fn list_members(
        &self,
        _category: &str,
        _limit: u32,
        continuation: Option<&str>,
    ) -> Result<Value, KiraError> {
        self.continuations
            .lock()
            .unwrap()
            .push(continuation.map(str::to_string));
        self.pages
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(KiraError::ListingHttp("no more pages".to_string())))
    }
}

impl AskClient for MockSnpedia {
    fn ask(&self, query: &str) -> Result<Value, KiraError> {
        let title = query
            .strip_prefix("[[")
            .and_then(|rest| rest.split("]]").next())
            .unwrap_or_default()
            .to_string();
        self.asked.lock().unwrap().push(title.clone());
        self.answers
            .get(&title)
            .cloned()
            .ok_or_else(|| KiraError::AskHttp(format!("connection reset for {title}")))
    }
}

pub fn listing_page(titles: &[&str], continuation: Option<&str>) -> Value {
    let members: Vec<Value> = titles
        .iter()
        .enumerate()
        .map(|(index, title)| json!({"pageid": index, "ns": 0, "title": title}))
        .collect();
    let mut page = json!({"batchcomplete": "", "query": {"categorymembers": members}});
    if let Some(token) = continuation {
        page["continue"] = json!({"cmcontinue": token, "continue": "-||"});
    }
    page
}

pub fn ask_answer(title: &str, allele1: &str, allele2: &str, gene: Option<&str>) -> Value {
    let gene = match gene {
        Some(name) => json!([{
            "fulltext": name,
            "fullurl": format!("https://bots.snpedia.com/index.php/{name}"),
            "namespace": 0,
            "exists": "1",
            "displaytitle": ""
        }]),
        None => json!([]),
    };
    json!({
        "query": {
            "printrequests": [],
            "results": {
                title: {
                    "printouts": {
                        "Rsnum": [1801133],
                        "Genotype": [],
                        "Allele1": [allele1],
                        "Allele2": [allele2],
                        "Magnitude": [2.5],
                        "Repute": ["Bad"],
                        "Summary": ["reduced enzyme activity"],
                        "In gene": gene
                    },
                    "fulltext": title,
                    "namespace": 0
                }
            },
            "serializer": "SMW\\Serializers\\QueryResultSerializer",
            "version": 2,
            "meta": {"hash": "x", "count": 1, "offset": 0, "source": "", "time": "0.01"}
        }
    })
}
