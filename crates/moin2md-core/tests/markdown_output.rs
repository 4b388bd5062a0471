//! Read translated pages back with a CommonMark parser to check that the
//! output has the structure the wiki page had.

use moin2md_core::{config::Config, translate};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use std::path::PathBuf;

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name);
    std::fs::read_to_string(path).unwrap()
}

fn headings(md: &str) -> Vec<HeadingLevel> {
    Parser::new(md)
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { level, .. }) => Some(level),
            _ => None,
        })
        .collect()
}

fn link_targets(md: &str) -> Vec<String> {
    Parser::new(md)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

#[test]
fn galaxy_admin_headings() {
    let md = translate(&fixture("galaxy_admin.moin"), &Config::default()).unwrap();
    assert_eq!(headings(&md), vec![HeadingLevel::H1, HeadingLevel::H2, HeadingLevel::H2]);
}

#[test]
fn galaxy_admin_links_survive_as_markdown_links() {
    let md = translate(&fixture("galaxy_admin.moin"), &Config::default()).unwrap();
    assert_eq!(
        link_targets(&md),
        vec![
            "CloudMan",
            "/GetGalaxy",
            "CloudMan",
            "Admin/Maintenance",
            "http://deploy.com",
            "Admin/License",
            "Admin/RunningTests",
            "Community/GalaxyAdmins",
            "Admin/SwitchingToGithubFromBitbucket",
            "http://galaxyproject.org/search/getgalaxy",
        ]
    );
}

#[test]
fn image_link_is_inline_html() {
    let md = translate(
        "[[http://x.org/search|{{attachment:logo.png|Logo}}]]\n",
        &Config::default(),
    )
    .unwrap();
    let has_html = Parser::new(&md).any(|event| matches!(event, Event::Html(_) | Event::InlineHtml(_)));
    assert!(has_html, "{md}");
    assert!(link_targets(&md).is_empty());
}

#[test]
fn nested_items_become_nested_lists() {
    let md = translate(" * top\n   * child\n * sibling\n", &Config::default()).unwrap();
    let lists = Parser::new(&md)
        .filter(|event| matches!(event, Event::Start(Tag::List(None))))
        .count();
    assert_eq!(lists, 2, "{md}");
}

fn count(md: &str, wanted: fn(&Event) -> bool) -> usize {
    Parser::new(md).filter(|event| wanted(event)).count()
}

#[test]
fn one_space_steps_still_nest() {
    let md = translate(" * a\n  * b\n   * c\n", &Config::default()).unwrap();
    assert_eq!(count(&md, |e| matches!(e, Event::Start(Tag::List(None)))), 3, "{md}");
    assert_eq!(count(&md, |e| matches!(e, Event::Start(Tag::Item))), 3, "{md}");
}

#[test]
fn deep_jump_is_one_level_not_continuation_text() {
    let md = translate(" * a\n       * b\n", &Config::default()).unwrap();
    assert_eq!(count(&md, |e| matches!(e, Event::Start(Tag::List(None)))), 2, "{md}");
    assert_eq!(count(&md, |e| matches!(e, Event::Start(Tag::Item))), 2, "{md}");
    assert_eq!(count(&md, |e| matches!(e, Event::SoftBreak)), 0, "{md}");
}

#[test]
fn bracket_in_link_text_keeps_the_link() {
    let md = translate("See [[Page|a]b]] here.\n", &Config::default()).unwrap();
    assert_eq!(link_targets(&md), vec!["Page"]);
}

#[test]
fn link_target_with_space_stays_one_link() {
    let md = translate("[[FrontPage/Use Galaxy|Use Galaxy]]\n", &Config::default()).unwrap();
    assert_eq!(link_targets(&md), vec!["FrontPage/Use Galaxy"]);
}
