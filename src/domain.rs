use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// One fetched attribute bundle, stored as a single line of the record stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rsid: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub genotype: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub allele1: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub allele2: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub magnitude: Option<Number>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub repute: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gene: Option<String>,
}

impl Record {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rsid: None,
            genotype: None,
            allele1: None,
            allele2: None,
            magnitude: None,
            repute: None,
            summary: None,
            gene: None,
        }
    }
}

/// Text view of a loosely typed upstream value. Numbers keep their decimal
/// form, anything that is not a scalar is treated as absent.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

pub fn value_as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(number) => Some(number.clone()),
        Value::String(text) => {
            let text = text.trim();
            if let Ok(int) = text.parse::<i64>() {
                return Some(Number::from(int));
            }
            text.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_text(&value))
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<Number>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_as_number(&value))
}

/// Lookup key for a variant: lower-cased title with any parenthetical
/// suffix and surrounding whitespace removed (`Rs123(A;G)` -> `rs123`).
pub fn normalize_identifier(title: &str) -> String {
    let lowered = title.to_lowercase();
    lowered
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Two alleles in ASCII order, so `(A, G)` and `(G, A)` share one key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllelePair {
    low: String,
    high: String,
}

impl AllelePair {
    pub fn new(first: Option<&str>, second: Option<&str>) -> Self {
        let first = first.unwrap_or_default().trim().to_uppercase();
        let second = second.unwrap_or_default().trim().to_uppercase();
        if first <= second {
            Self {
                low: first,
                high: second,
            }
        } else {
            Self {
                low: second,
                high: first,
            }
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}

impl fmt::Display for AllelePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.low, self.high)
    }
}
