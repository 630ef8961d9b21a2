use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

pub const DEFAULT_CONFIG_FILE: &str = "kira-gt.json";
pub const DEFAULT_API_URL: &str = "https://bots.snpedia.com/api.php";
pub const DEFAULT_CATEGORY: &str = "Category:Is_a_genotype";
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_LISTING_DELAY_MS: u64 = 100;
pub const DEFAULT_FETCH_DELAY_MS: u64 = 50;
pub const DEFAULT_IDENTIFIER_PATTERN: &str = "(?i)^rs";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub listing_delay_ms: Option<u64>,
    #[serde(default)]
    pub fetch_delay_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub identifier_pattern: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub files: FileNames,
    #[serde(default)]
    pub attributes: AttributeNames,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileNames {
    pub identifiers: String,
    pub records: String,
    pub by_rsid: String,
    pub by_gene: String,
    pub archive: String,
}

impl Default for FileNames {
    fn default() -> Self {
        Self {
            identifiers: "genotypes.txt".to_string(),
            records: "genotypes.jsonl".to_string(),
            by_rsid: "genotypes_by_rsid.json".to_string(),
            by_gene: "genotypes_by_gene.json".to_string(),
            archive: "genotypes_by_rsid.zip".to_string(),
        }
    }
}

/// Printout names requested from the semantic endpoint, one per record field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AttributeNames {
    pub rsid: String,
    pub genotype: String,
    pub allele1: String,
    pub allele2: String,
    pub magnitude: String,
    pub repute: String,
    pub summary: String,
    pub gene: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            rsid: "Rsnum".to_string(),
            genotype: "Genotype".to_string(),
            allele1: "Allele1".to_string(),
            allele2: "Allele2".to_string(),
            magnitude: "Magnitude".to_string(),
            repute: "Repute".to_string(),
            summary: "Summary".to_string(),
            gene: "In gene".to_string(),
        }
    }
}

impl AttributeNames {
    pub fn all(&self) -> [&str; 8] {
        [
            &self.rsid,
            &self.genotype,
            &self.allele1,
            &self.allele2,
            &self.magnitude,
            &self.repute,
            &self.summary,
            &self.gene,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: String,
    pub category: String,
    pub page_size: u32,
    pub listing_delay: Duration,
    pub fetch_delay: Duration,
    pub request_timeout: Option<Duration>,
    pub identifier_pattern: Regex,
    pub data_dir: Utf8PathBuf,
    pub files: FileNames,
    pub attributes: AttributeNames,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using built-in defaults");
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(KiraError::ConfigParse(
                "page_size must be greater than zero".to_string(),
            ));
        }

        let pattern = config
            .identifier_pattern
            .unwrap_or_else(|| DEFAULT_IDENTIFIER_PATTERN.to_string());
        let identifier_pattern =
            Regex::new(&pattern).map_err(|err| KiraError::InvalidPattern(err.to_string()))?;

        Ok(ResolvedConfig {
            api_url: config
                .api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            category: config
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            page_size,
            listing_delay: Duration::from_millis(
                config.listing_delay_ms.unwrap_or(DEFAULT_LISTING_DELAY_MS),
            ),
            fetch_delay: Duration::from_millis(
                config.fetch_delay_ms.unwrap_or(DEFAULT_FETCH_DELAY_MS),
            ),
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            identifier_pattern,
            data_dir: Utf8PathBuf::from(config.data_dir.unwrap_or_else(|| ".".to_string())),
            files: config.files,
            attributes: config.attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.page_size, 500);
        assert_eq!(resolved.category, "Category:Is_a_genotype");
        assert_eq!(resolved.listing_delay, Duration::from_millis(100));
        assert_eq!(resolved.fetch_delay, Duration::from_millis(50));
        assert!(resolved.request_timeout.is_none());
        assert_eq!(resolved.files.records, "genotypes.jsonl");
        assert_eq!(resolved.attributes.gene, "In gene");
        assert!(resolved.identifier_pattern.is_match("RS123"));
        assert!(!resolved.identifier_pattern.is_match("Gs123"));
    }

    #[test]
    fn partial_file_sections_keep_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"page_size": 50, "files": {"records": "out.jsonl"}}"#)
                .unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.page_size, 50);
        assert_eq!(resolved.files.records, "out.jsonl");
        assert_eq!(resolved.files.identifiers, "genotypes.txt");
    }
}
