pub mod ast;
pub mod batch;
pub mod composer;
pub mod config;
pub mod error;
pub mod parser;
pub mod rewriter;
pub mod selfcheck;
pub mod source;

use std::borrow::Cow;

use config::Config;
pub use error::{BatchError, RuleMismatch, TranslateError};
pub use parser::Rule;

/// Full Moin-to-Markdown pipeline: normalize, parse, compose, rewrite links.
pub fn translate(input: &str, config: &Config) -> Result<String, TranslateError> {
    let prepared = if config.options.normalize_source {
        source::prepare(input)
    } else {
        Cow::Borrowed(input)
    };
    let doc = parser::parse_document(&prepared, config.options.strict)?;
    let raw_md = composer::compose_document(&doc, config);
    Ok(rewriter::rewrite_markdown(&raw_md, config))
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::ast::{Element, Macro};
    use std::path::PathBuf;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
    }

    fn normalize(s: &str) -> Vec<String> {
        s.lines().map(|l| l.trim_end().to_string()).collect()
    }

    /// All fixtures that have .moin + .toml + .md (expected).
    const FIXTURE_NAMES: &[&str] = &["galaxy_admin", "developer_hub"];

    #[test]
    fn test_full_pipeline_all_fixtures() {
        for name in FIXTURE_NAMES {
            let read = |ext: &str| {
                std::fs::read_to_string(fixture_path(&format!("{name}.{ext}")))
                    .unwrap_or_else(|e| panic!("fixture {name}.{ext}: {e}"))
            };
            let config = Config::from_toml(&read("toml")).unwrap();
            let result = translate(&read("moin"), &config).unwrap();
            assert_eq!(
                normalize(&result),
                normalize(&read("md")),
                "fixture {name}: output does not match expected"
            );
        }
    }

    #[test]
    fn test_fixture_matches_builtin_worked_example() {
        let input = std::fs::read_to_string(fixture_path("galaxy_admin.moin")).unwrap();
        assert_eq!(normalize(&input), normalize(selfcheck::WORKED_EXAMPLE));
    }

    #[test]
    fn test_header_list_toc_in_order() {
        let input = "= Title =\n * [[Page|Link]]\n * <<Include(Other)>>\n * plain\n<<TableOfContents>>";
        let doc = parser::parse_document(input, false).unwrap();
        assert_eq!(doc.elements.len(), 3);
        assert!(matches!(doc.elements[0], Element::SectionHeader(_)));
        assert!(matches!(&doc.elements[1], Element::BulletList(l) if l.items.len() == 3));
        assert!(matches!(doc.elements[2], Element::Macro(Macro::TableOfContents(_))));

        assert_eq!(
            composer::compose_document(&doc, &Config::default()),
            "# Title\n* [Link](Page)\n* INCLUDE(Other)\n* plain\nTABLE_OF_CONTENTS"
        );
    }

    #[test]
    fn test_header_list_toc_with_final_newline() {
        let input = "= Title =\n * [[Page|Link]]\n * <<Include(Other)>>\n * plain\n<<TableOfContents>>\n";
        let doc = parser::parse_document(input, false).unwrap();
        assert_eq!(doc.elements.len(), 4);
        assert!(matches!(doc.elements[0], Element::SectionHeader(_)));
        assert!(matches!(&doc.elements[1], Element::BulletList(l) if l.items.len() == 3));
        assert!(matches!(doc.elements[2], Element::Macro(Macro::TableOfContents(_))));
        assert_eq!(doc.elements[3], Element::TrailingWhitespace);

        assert_eq!(
            translate(input, &Config::default()).unwrap(),
            "# Title\n* [Link](Page)\n* INCLUDE(Other)\n* plain\nTABLE_OF_CONTENTS\n"
        );
    }

    #[test]
    fn test_no_break_spaces_are_normalized() {
        let result = translate("Galaxy\u{a0}Admin\u{a0}page\r\n", &Config::default()).unwrap();
        assert_eq!(result, "Galaxy Admin page\n");
    }

    #[test]
    fn test_without_normalization_no_break_space_is_unrecognized() {
        let mut config = Config::default();
        config.options.normalize_source = false;
        let err = translate("Galaxy\u{a0}Admin\n", &config).unwrap_err();
        assert!(matches!(err, TranslateError::UnrecognizedConstruct { offset: 6, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(translate("", &Config::default()).unwrap(), "");
    }

    #[test]
    fn test_strict_mode_from_config() {
        let config = Config::from_toml("[options]\nstrict = true\n").unwrap();
        assert!(translate("|| a ||\n", &Config::default()).is_ok());
        assert!(matches!(
            translate("|| a ||\n", &config),
            Err(TranslateError::UnsupportedConstruct { line: 1, column: 1, .. })
        ));
    }

    #[test]
    fn test_link_rewrite_applied_after_compose() {
        let config = Config::from_toml(
            r#"
[links]
make_absolute = true
base_url = "https://wiki.example.org"
"#,
        )
        .unwrap();
        let result = translate(" * [[/GetGalaxy|Install]]\n * [[Admin/License|License]]\n", &config).unwrap();
        assert_eq!(
            result,
            "* [Install](./GetGalaxy)\n* [License](https://wiki.example.org/Admin/License)\n"
        );
    }
}
