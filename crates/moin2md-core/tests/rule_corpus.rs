//! Data-driven grammar checks: every corpus entry names a rule and an input
//! the rule must (or must not) match in full, plus whole documents with the
//! error class they are expected to produce.

use moin2md_core::config::Config;
use moin2md_core::parser::parse_exact;
use moin2md_core::{translate, Rule, TranslateError};
use std::path::PathBuf;

#[derive(serde::Deserialize)]
struct Corpus {
    rules: Vec<RuleCase>,
    documents: Vec<DocumentCase>,
}

#[derive(serde::Deserialize)]
struct RuleCase {
    rule: String,
    input: String,
    accept: bool,
}

#[derive(serde::Deserialize)]
struct DocumentCase {
    input: String,
    strict: bool,
    error: Option<String>,
}

fn load_corpus() -> Corpus {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("rule_corpus.json");
    let json = std::fs::read_to_string(path).expect("rule_corpus.json not found");
    serde_json::from_str(&json).expect("invalid rule_corpus.json")
}

fn error_class(err: &TranslateError) -> &'static str {
    match err {
        TranslateError::UnrecognizedConstruct { .. } => "unrecognized",
        TranslateError::StructuralInconsistency { .. } => "structural",
        TranslateError::UnsupportedConstruct { .. } => "unsupported",
    }
}

#[test]
fn rule_corpus_accept_and_reject() {
    let corpus = load_corpus();
    assert!(!corpus.rules.is_empty());

    for (i, case) in corpus.rules.iter().enumerate() {
        let rule = Rule::from_name(&case.rule).unwrap_or_else(|| panic!("case {i}: unknown rule {:?}", case.rule));
        let result = parse_exact(rule, &case.input);
        assert_eq!(
            result.is_ok(),
            case.accept,
            "case {i}: {rule} on {:?} gave {result:?}",
            case.input
        );
    }
}

#[test]
fn document_corpus_error_classes() {
    let corpus = load_corpus();

    for (i, case) in corpus.documents.iter().enumerate() {
        let mut config = Config::default();
        config.options.strict = case.strict;
        let result = translate(&case.input, &config);
        let class = result.as_ref().err().map(error_class);
        assert_eq!(
            class,
            case.error.as_deref(),
            "case {i}: {:?} (strict: {}) gave {result:?}",
            case.input,
            case.strict
        );
    }
}
