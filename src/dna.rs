use std::io::BufRead;

use serde::Serialize;
use serde_json::Number;

use crate::domain::AllelePair;
use crate::error::KiraError;
use crate::lookup::{Lookup, RsidInfo};

/// One genotype call from a consumer raw-DNA export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnaCall {
    pub rsid: String,
    pub alleles: AllelePair,
}

/// Parses `rsid chrom pos genotype` (23andMe) or
/// `rsid chrom pos allele1 allele2` (AncestryDNA) tab-separated lines.
/// Comments, headers and no-calls yield `None`.
pub fn parse_dna_line(line: &str) -> Option<DnaCall> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }
    let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
    let (first, second) = match columns.as_slice() {
        [_, _, _, first, second, ..] => (first.to_string(), second.to_string()),
        [_, _, _, genotype] => {
            let mut chars = genotype.chars();
            let first = chars.next()?.to_string();
            let second = chars.next().map(String::from).unwrap_or_else(|| first.clone());
            (first, second)
        }
        _ => return None,
    };
    if is_no_call(&first) || is_no_call(&second) {
        return None;
    }
    let rsid = columns[0].to_lowercase();
    if rsid == "rsid" {
        return None;
    }
    Some(DnaCall {
        rsid,
        alleles: AllelePair::new(Some(&first), Some(&second)),
    })
}

fn is_no_call(allele: &str) -> bool {
    allele.is_empty() || allele == "-" || allele == "0"
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// `rs53576(A;G)`
    pub rsid: String,
    pub gene: String,
    pub summary: String,
    pub magnitude: Number,
    pub repute: String,
}

pub fn read_calls<R: BufRead>(reader: R) -> Result<Vec<DnaCall>, KiraError> {
    let mut calls = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|err| KiraError::DnaRead(err.to_string()))?;
        if let Some(call) = parse_dna_line(&line) {
            calls.push(call);
        }
    }
    Ok(calls)
}

/// Looks every call up and orders hits by magnitude, highest first; ties keep
/// file order.
pub fn match_calls(calls: &[DnaCall], lookup: &Lookup<RsidInfo>) -> Vec<Match> {
    let mut matches: Vec<Match> = calls
        .iter()
        .filter_map(|call| {
            let info = lookup.get(&call.rsid, &call.alleles)?;
            Some(Match {
                rsid: format!("{}({})", call.rsid, call.alleles),
                gene: info.gene.clone(),
                summary: info.summary.clone(),
                magnitude: info.magnitude.clone(),
                repute: info.repute.clone(),
            })
        })
        .collect();
    matches.sort_by(|a, b| magnitude_of(b).total_cmp(&magnitude_of(a)));
    matches
}

fn magnitude_of(item: &Match) -> f64 {
    item.magnitude.as_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_export_layouts() {
        let twentythree = parse_dna_line("rs53576\t3\t8804371\tAG").unwrap();
        assert_eq!(twentythree.rsid, "rs53576");
        assert_eq!(twentythree.alleles, AllelePair::new(Some("A"), Some("G")));

        let ancestry = parse_dna_line("rs53576\t3\t8804371\tg\ta\r").unwrap();
        assert_eq!(ancestry.alleles, AllelePair::new(Some("A"), Some("G")));

        let haploid = parse_dna_line("rs1\tY\t100\tT").unwrap();
        assert_eq!(haploid.alleles, AllelePair::new(Some("T"), Some("T")));
    }

    #[test]
    fn skips_comments_headers_and_no_calls() {
        assert!(parse_dna_line("# rsid\tchromosome\tposition\tgenotype").is_none());
        assert!(parse_dna_line("rsid\tchromosome\tposition\tallele1\tallele2").is_none());
        assert!(parse_dna_line("rs1\t1\t10\t--").is_none());
        assert!(parse_dna_line("rs1\t1\t10\t0\t0").is_none());
        assert!(parse_dna_line("").is_none());
    }
}
