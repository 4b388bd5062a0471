//! Built-in acceptance checks for the grammar.
//!
//! Every rule carries inputs it must accept whole and inputs it must refuse.
//! `run_all` exercises them plus a complete wiki page, and is what the CLI's
//! `--self-test` flag runs.

use crate::composer::{compose, compose_document};
use crate::config::Config;
use crate::error::{RuleMismatch, TranslateError};
use crate::parser::{parse_document, parse_exact, Rule};
use crate::source;

/// A real administration hub page: include macros, headers, link lists, a
/// centered image link.
pub const WORKED_EXAMPLE: &str = r#"
<<Include(Develop/LinkBox)>>
<<Include(Admin/LinkBox)>>
<<Include(FAQs/LinkBox)>>

= Galaxy Administration =
This is the hub page for the section of this wiki on how to deploy and administer your own copy of Galaxy.

== Deploying ==

 * [[CloudMan]]
 * [[/GetGalaxy|Install own Galaxy]]
 * [[CloudMan|Install on the Cloud Infrastructure]]
 * [[Admin/Maintenance|Maintaining an Instance]]
 * [[http://deploy.com]]

== Other ==
 * [[Admin/License|License]]
 * [[Admin/RunningTests|Running Tests]]
 * [[Community/GalaxyAdmins|Galaxy-Admins discussion group]]
 * [[Admin/SwitchingToGithubFromBitbucket|Switching to Github from Bitbucket]]

<<div(center)>>
[[http://galaxyproject.org/search/getgalaxy|{{attachment:Images/Logos/GetGalaxySearch.png|Search all Galaxy administration resources|width="120"}}]]

[[http://galaxyproject.org/search/getgalaxy|Search all Galaxy administration resources]]
<<div>>

"#;

/// Moin markup that must never survive translation of a clean page.
const MOIN_MARKERS: [&str; 5] = ["[[", "]]", "<<", ">>", "{{"];

#[derive(Debug, Clone, Copy)]
pub struct RuleExamples {
    pub rule: Rule,
    pub accept: &'static [&'static str],
    pub reject: &'static [&'static str],
}

pub fn examples(rule: Rule) -> RuleExamples {
    let (accept, reject): (&'static [&'static str], &'static [&'static str]) = match rule {
        Rule::PlainText => (
            &[" Testing with no special terminator", " OK DOKE "],
            &[
                " OK DOKE[[",
                " OK DOKE]]",
                " OK DOKE. <<",
                "Uh-huh, this text does'nt mean anything. [[",
                " OK DOKE}}",
            ],
        ),
        Rule::Punctuation => (&[".", "/"], &[" OK[", " ", "<<", "}}"]),
        Rule::QuotedString => (
            &["'Jump'", r#""I Can't do this no more!""#, r#""= LAPTOP WITH BROWSER =""#],
            &["''", "'open", "Jump"],
        ),
        Rule::PagePath => (
            &[
                "FrontPage/Use Galaxy",
                "FrontPage/Use Galaxy#This Part of the page",
                "/Includes",
            ],
            &["|Text", "[[Page]]"],
        ),
        Rule::LinkProtocol => (&["http://", "ftp://", "https://"], &["mailto:", "http:/"]),
        Rule::ExternalLink => (
            &[
                "[[http://link.com]]",
                "[[ftp://this.here.com/path/file.txt]]",
                "[[https://link.com/]]",
                "[[http://link.com|Linkin somewhere]]",
                "[[ftp://this.here.com/path/file.txt|Text for link.]]",
                "[[https://link.com/| Whitespace test ]]",
            ],
            &["[[LinkToPage]]", "[[http://link.com"],
        ),
        Rule::InternalLink => (
            &[
                "[[/PathToPage]]",
                "[[path/file.txt]]",
                "[[path/more/path/Page Name]]",
                "[[/PathToPage|With Text]]",
                "[[path/file.txt|uh-huh!]]",
                "[[path/more/path/Page Name|Whitespace test 1]]",
                "[[path/more/path/Page Name| Whitespace test 2 ]]",
            ],
            &["[[http://link.com]]", "[[]]"],
        ),
        Rule::ImageLink => (
            &[
                "[[search/getgalaxy|{{attachment:GetGalaxySearch.png}}]]",
                "[[http://gp.org/sch/getxy|{{attachment:Im/L/GGS.png|S all}}]]",
                r#"[[http://gt.g/gy|{{attachment:Is/L/G.png|s a|width="120"}}]]"#,
            ],
            &["[[LinkToPage]]", "[[a|{{attachment:b]]"],
        ),
        Rule::Link => (
            &[
                "[[LinkToPage]]",
                "[[LinktoPage|Text shown for link]]",
                "[[http://link.com|Link to here]]",
            ],
            &["[[never closed", "LinkToPage"],
        ),
        Rule::NamedMacroParameter => (
            &[
                ", fish='jump'",
                r#", fish="jump high""#,
                r#", from="= LAPTOP WITH BROWSER =""#,
            ],
            &[",", "fish='jump'"],
        ),
        Rule::EmptyMacroParameter => (&[","], &[", fish='jump'"]),
        Rule::IncludeMacroParameter => (&[", fish='jump'", ",", " "], &["fish"]),
        Rule::IncludeMacro => (
            &[
                "Include(FrontPage/Use Galaxy)",
                r#"Include(/Includes, , from="= LAPTOP =", to="END_INCLUDE")"#,
                r#"Include(/Includes, , from="= LAPTOP =\n", to="\nEND_INCLUDE")"#,
            ],
            &["Include()", "Include(Page"],
        ),
        Rule::DivMacro => (&["div(center)", "div", "div(solid blue)"], &["dev", "div("]),
        Rule::TocMacro => (
            &["TableOfContents", "TableOfContents(2)"],
            &["TableOfContents()", "Contents"],
        ),
        Rule::Macro => (
            &[
                "<<div>>",
                "<<div(center)>>",
                "<<Include(FrontPage/Use Galaxy)>>",
                "<<Include(Develop/LinkBox)>>",
                r#"<<Include(/Includes, , from="= LA T =\n", to="\nEN_CL")>>"#,
                "<<TableOfContents>>",
            ],
            &["<<Anchor(top)>>", "<<div", "<<TableOfContents(x)>>"],
        ),
        Rule::SectionHeader => (
            &[
                "= Heading 1 =\n",
                "== Heading Too! ==\n",
                "= A single tool or a suite of tools per repository =\n",
            ],
            &["= Heading 1 = \n", "== Unbalanced =\n", "= Heading 1 ="],
        ),
        Rule::BulletListItem => (
            &[" * E\n", " * Electric boogaloo\n", " * A simple case.\n", " * A simple case \n"],
            &[" *no space\n", "* \n", " * no newline"],
        ),
        Rule::BulletList => (
            &[
                " * One Item Only\n",
                " * A simple case.\n * With two items\n",
                " * A simple case.\n   * With nested item\n",
                " * A simpler case.\n   * With nested item\n   * and another\n",
                " * A less simplerer case.\n   * With nested item\n   * And another\n     * and More!\n   * Uh huh.\n",
            ],
            &["Not a list\n", ""],
        ),
        Rule::Subelement => (
            &["<<TableOfContents>>", "[[Page]]", "'quoted'", "plain words", "."],
            &[" \n", "\n"],
        ),
        Rule::Paragraph => (
            &["Let's try plain text first.", "See [[Page|here]], or <<TableOfContents>>."],
            &["\n", ""],
        ),
        Rule::TrailingWhitespace => (&["\n", " \t\n"], &["text\n", "  "]),
        Rule::Element => (
            &["= Heading 1 =\n", " * item\n", "<<TableOfContents>>", "Some text.", "\n"],
            &["\u{2003}"],
        ),
        Rule::Document => (&[WORKED_EXAMPLE, "", "= T =\n"], &["text\u{2003}\n"]),
    };
    RuleExamples { rule, accept, reject }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{rule}: {problem} for {input:?}")]
pub struct SelfCheckFailure {
    pub rule: Rule,
    pub input: String,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Problem {
    #[error("expected a match but got: {0}")]
    Rejected(RuleMismatch),
    #[error("matched but rendered nothing")]
    EmptyOutput,
    #[error("expected no match")]
    Accepted,
    #[error("translation failed: {0}")]
    Translate(TranslateError),
    #[error("output still contains {0:?}")]
    Leftover(&'static str),
}

#[derive(Debug, Default)]
pub struct SelfCheckReport {
    pub rules_checked: usize,
    pub examples_checked: usize,
    pub failures: Vec<SelfCheckFailure>,
}

impl SelfCheckReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run one rule's examples. Accepted inputs must match whole and render to
/// something; rejected inputs must not match whole.
pub fn check_rule(rule: Rule) -> Vec<SelfCheckFailure> {
    let config = Config::default();
    let cases = examples(rule);
    let mut failures = Vec::new();

    for input in cases.accept {
        let problem = match parse_exact(rule, input) {
            Err(mismatch) => Some(Problem::Rejected(mismatch)),
            Ok(node) if !input.is_empty() && compose(&node, &config).is_empty() => Some(Problem::EmptyOutput),
            Ok(_) => None,
        };
        if let Some(problem) = problem {
            failures.push(SelfCheckFailure {
                rule,
                input: input.to_string(),
                problem,
            });
        }
    }
    for input in cases.reject {
        if parse_exact(rule, input).is_ok() {
            failures.push(SelfCheckFailure {
                rule,
                input: input.to_string(),
                problem: Problem::Accepted,
            });
        }
    }
    failures
}

/// Translate `WORKED_EXAMPLE` strictly and make sure no Moin markup leaks
/// into the output.
pub fn check_worked_example() -> Vec<SelfCheckFailure> {
    let failure = |problem| SelfCheckFailure {
        rule: Rule::Document,
        input: WORKED_EXAMPLE.to_string(),
        problem,
    };
    let prepared = source::prepare(WORKED_EXAMPLE);
    let doc = match parse_document(&prepared, true) {
        Ok(doc) => doc,
        Err(e) => return vec![failure(Problem::Translate(e))],
    };
    let markdown = compose_document(&doc, &Config::default());
    MOIN_MARKERS
        .into_iter()
        .filter(|marker| markdown.contains(marker))
        .map(|marker| failure(Problem::Leftover(marker)))
        .collect()
}

pub fn run_all() -> SelfCheckReport {
    let mut report = SelfCheckReport::default();
    for rule in Rule::ALL {
        let cases = examples(rule);
        report.rules_checked += 1;
        report.examples_checked += cases.accept.len() + cases.reject.len();
        report.failures.extend(check_rule(rule));
    }
    report.examples_checked += 1;
    report.failures.extend(check_worked_example());

    if report.passed() {
        tracing::info!(
            rules = report.rules_checked,
            examples = report.examples_checked,
            "self-test passed"
        );
    } else {
        for failure in &report.failures {
            tracing::warn!("{failure}");
        }
    }
    report
}
