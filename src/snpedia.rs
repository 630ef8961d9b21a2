use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::{AttributeNames, ResolvedConfig};
use crate::domain::{Record, value_as_number, value_as_text};
use crate::error::KiraError;

/// Paginated category listing (`list=categorymembers`).
pub trait ListingClient {
    fn list_members(
        &self,
        category: &str,
        limit: u32,
        continuation: Option<&str>,
    ) -> Result<Value, KiraError>;
}

/// Semantic attribute query (`action=ask`).
pub trait AskClient {
    fn ask(&self, query: &str) -> Result<Value, KiraError>;
}

#[derive(Clone)]
pub struct SnpediaHttpClient {
    client: Client,
    api_url: String,
}

impl SnpediaHttpClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, KiraError> {
        Self::with_url(&config.api_url, config.request_timeout)
    }

    pub fn with_url(api_url: &str, timeout: Option<Duration>) -> Result<Self, KiraError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("kira-gt/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| KiraError::ClientBuild(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| KiraError::ClientBuild(err.to_string()))?;
        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    fn read_json<E, S>(response: Response, http: E, status: S) -> Result<Value, KiraError>
    where
        E: Fn(String) -> KiraError,
        S: Fn(u16, String) -> KiraError,
    {
        if !response.status().is_success() {
            let code = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "SNPedia request failed".to_string());
            return Err(status(code, message));
        }
        response.json().map_err(|err| http(err.to_string()))
    }
}

impl ListingClient for SnpediaHttpClient {
    fn list_members(
        &self,
        category: &str,
        limit: u32,
        continuation: Option<&str>,
    ) -> Result<Value, KiraError> {
        let limit = limit.to_string();
        let mut params = vec![
            ("action", "query"),
            ("format", "json"),
            ("list", "categorymembers"),
            ("cmtitle", category),
            ("cmlimit", limit.as_str()),
        ];
        if let Some(token) = continuation {
            params.push(("cmcontinue", token));
        }
        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .map_err(|err| KiraError::ListingHttp(err.to_string()))?;
        Self::read_json(response, KiraError::ListingHttp, |status, message| {
            KiraError::ListingStatus { status, message }
        })
    }
}

impl AskClient for SnpediaHttpClient {
    fn ask(&self, query: &str) -> Result<Value, KiraError> {
        let params = [("action", "ask"), ("format", "json"), ("query", query)];
        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .map_err(|err| KiraError::AskHttp(err.to_string()))?;
        Self::read_json(response, KiraError::AskHttp, |status, message| {
            KiraError::AskStatus { status, message }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub titles: Vec<String>,
    pub continuation: Option<String>,
}

pub fn parse_listing_page(raw: &Value) -> Result<ListingPage, KiraError> {
    let query = raw
        .get("query")
        .ok_or_else(|| KiraError::ListingShape("no 'query' field in response".to_string()))?;
    let members = query
        .get("categorymembers")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            KiraError::ListingShape("no 'categorymembers' field in query".to_string())
        })?;

    let titles = members
        .iter()
        .map(|item| {
            item.get("title")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect();

    let continuation = raw
        .get("continue")
        .and_then(|token| token.get("cmcontinue"))
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    Ok(ListingPage {
        titles,
        continuation,
    })
}

/// `[[Rs1801133(A;A)]]|?Rsnum|?Genotype|...`
pub fn ask_query(title: &str, attributes: &AttributeNames) -> String {
    let mut query = format!("[[{title}]]");
    for name in attributes.all() {
        query.push_str("|?");
        query.push_str(name);
    }
    query
}

pub fn extract_record(
    title: &str,
    raw: &Value,
    attributes: &AttributeNames,
) -> Result<Record, KiraError> {
    let subject = raw
        .get("query")
        .and_then(|query| query.get("results"))
        .and_then(Value::as_object)
        .ok_or_else(|| KiraError::AskShape(format!("no results object for {title}")))?
        .get(title)
        .ok_or_else(|| KiraError::AskShape(format!("{title} missing from results")))?;
    let printouts = subject
        .get("printouts")
        .and_then(Value::as_object)
        .ok_or_else(|| KiraError::AskShape(format!("no printouts for {title}")))?;

    let first = |name: &str| {
        printouts
            .get(name)
            .and_then(Value::as_array)
            .and_then(|values| values.first())
    };
    let text = |name: &str| first(name).and_then(value_as_text);

    // Page-type printouts arrive as objects, the display name is `fulltext`.
    let gene = first(attributes.gene.as_str())
        .and_then(Value::as_object)
        .and_then(|page| page.get("fulltext"))
        .and_then(value_as_text);

    Ok(Record {
        title: title.to_string(),
        rsid: text(attributes.rsid.as_str()),
        genotype: text(attributes.genotype.as_str()),
        allele1: text(attributes.allele1.as_str()),
        allele2: text(attributes.allele2.as_str()),
        magnitude: first(attributes.magnitude.as_str()).and_then(value_as_number),
        repute: text(attributes.repute.as_str()),
        summary: text(attributes.summary.as_str()),
        gene,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listing_page_reads_titles_and_token() {
        let raw = json!({
            "batchcomplete": "",
            "continue": {"cmcontinue": "page|52533130|123", "continue": "-||"},
            "query": {"categorymembers": [
                {"pageid": 1, "ns": 0, "title": "Rs1(A;A)"},
                {"pageid": 2, "ns": 0, "title": "I3000001(C;C)"}
            ]}
        });
        let page = parse_listing_page(&raw).unwrap();
        assert_eq!(page.titles, vec!["Rs1(A;A)", "I3000001(C;C)"]);
        assert_eq!(page.continuation.as_deref(), Some("page|52533130|123"));
    }

    #[test]
    fn listing_page_without_wrapper_is_shape_error() {
        let raw = json!({"error": {"code": "badvalue"}});
        let err = parse_listing_page(&raw).unwrap_err();
        assert!(matches!(err, KiraError::ListingShape(_)));
    }

    #[test]
    fn query_lists_every_attribute() {
        let query = ask_query("Rs1(A;G)", &AttributeNames::default());
        assert_eq!(
            query,
            "[[Rs1(A;G)]]|?Rsnum|?Genotype|?Allele1|?Allele2|?Magnitude|?Repute|?Summary|?In gene"
        );
    }
}
