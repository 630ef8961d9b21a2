use assert_matches::assert_matches;
use serde_json::json;

use kira_genotypes::config::AttributeNames;
use kira_genotypes::error::KiraError;
use kira_genotypes::snpedia::extract_record;

#[test]
fn first_value_of_each_printout() {
    let raw = json!({"query": {"results": {"Rs7412(C;T)": {"printouts": {
        "Rsnum": [7412, 1],
        "Genotype": ["(C;T)"],
        "Allele1": ["C"],
        "Allele2": ["T"],
        "Magnitude": [],
        "Summary": ["carrier of APOE e2"],
        "In gene": [{"fulltext": "APOE", "namespace": 0}]
    }}}}});
    let record = extract_record("Rs7412(C;T)", &raw, &AttributeNames::default()).unwrap();
    assert_eq!(record.rsid.as_deref(), Some("7412"));
    assert_eq!(record.genotype.as_deref(), Some("(C;T)"));
    assert_eq!(record.magnitude, None);
    assert_eq!(record.repute, None);
    assert_eq!(record.gene.as_deref(), Some("APOE"));
}

#[test]
fn gene_must_be_a_page_object() {
    let raw = json!({"query": {"results": {"rs1": {"printouts": {"In gene": ["APOE"]}}}}});
    let record = extract_record("rs1", &raw, &AttributeNames::default()).unwrap();
    assert_eq!(record.gene, None);
}

#[test]
fn missing_subject_is_shape_error() {
    let raw = json!({"query": {"results": {"rs2": {"printouts": {}}}}});
    let err = extract_record("rs1", &raw, &AttributeNames::default()).unwrap_err();
    assert_matches!(err, KiraError::AskShape(_));

    let raw = json!({"query": {"results": {"rs1": {}}}});
    let err = extract_record("rs1", &raw, &AttributeNames::default()).unwrap_err();
    assert_matches!(err, KiraError::AskShape(_));
}
