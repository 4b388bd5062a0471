//! Render a parsed Moin tree as Markdown.
//!
//! Each node renders from its own attributes and its children's output only;
//! nothing looks at siblings or parents, and output order is source order.

use crate::ast::*;
use crate::config::Config;

/// Render a whole document.
pub fn compose_document(doc: &Document, config: &Config) -> String {
    let mut out = String::new();
    for element in &doc.elements {
        compose_element(element, config, &mut out);
    }
    out
}

/// Render any single node.
pub fn compose(node: &Node, config: &Config) -> String {
    let mut out = String::new();
    match node {
        Node::PlainText(text) => out.push_str(text),
        Node::Punctuation(c) => out.push(*c),
        Node::QuotedString(quoted) => compose_quoted(quoted, config, &mut out),
        Node::PagePath(path) => out.push_str(path),
        Node::LinkProtocol(protocol) => out.push_str(&protocol.text),
        Node::Link(link) => compose_link(link, &mut out),
        Node::IncludeParam(param) => out.push_str(&param.raw),
        Node::Macro(found) => compose_macro(found, config, &mut out),
        Node::SectionHeader(header) => compose_header(header, &mut out),
        Node::BulletListItem(item) => compose_list_item(item, 0, config, &mut out),
        Node::BulletList(list) => compose_list(list, config, &mut out),
        Node::Subelement(sub) => compose_subelement(sub, config, &mut out),
        Node::Paragraph(paragraph) => compose_inline(&paragraph.content, config, &mut out),
        Node::TrailingWhitespace => out.push('\n'),
        Node::Element(element) => compose_element(element, config, &mut out),
        Node::Document(doc) => out.push_str(&compose_document(doc, config)),
    }
    out
}

fn compose_element(element: &Element, config: &Config, out: &mut String) {
    match element {
        Element::SectionHeader(header) => compose_header(header, out),
        Element::BulletList(list) => compose_list(list, config, out),
        Element::Macro(found) => compose_macro(found, config, out),
        Element::Paragraph(paragraph) => compose_inline(&paragraph.content, config, out),
        Element::TrailingWhitespace => out.push('\n'),
    }
}

/// `== Name ==` becomes `## Name`. Markdown stops at six levels.
fn compose_header(header: &SectionHeader, out: &mut String) {
    const MAX_DEPTH: usize = 6;

    out.push_str(&"#".repeat(header.depth.min(MAX_DEPTH)));
    out.push(' ');
    out.push_str(&header.name);
    out.push('\n');
}

/// Moin depths are raw leading-space counts, so they are mapped to nesting
/// levels first: a deeper item opens a level, a shallower one closes levels
/// until it reaches one no deeper than itself.
fn compose_list(list: &BulletList, config: &Config, out: &mut String) {
    let mut open_depths: Vec<usize> = Vec::new();
    for item in &list.items {
        while open_depths.last().is_some_and(|&depth| depth > item.depth) {
            open_depths.pop();
        }
        if open_depths.last() != Some(&item.depth) {
            open_depths.push(item.depth);
        }
        compose_list_item(item, open_depths.len() - 1, config, out);
    }
}

/// Two spaces per level lines a child up with its parent's content column.
fn compose_list_item(item: &BulletListItem, level: usize, config: &Config, out: &mut String) {
    if config.lists.nested {
        out.push_str(&"  ".repeat(level));
    }
    out.push_str("* ");
    compose_inline(&item.content, config, out);
    out.push('\n');
}

fn compose_inline(content: &[Subelement], config: &Config, out: &mut String) {
    for sub in content {
        compose_subelement(sub, config, out);
    }
}

fn compose_subelement(sub: &Subelement, config: &Config, out: &mut String) {
    match sub {
        Subelement::Macro(found) => compose_macro(found, config, out),
        Subelement::Link(link) => compose_link(link, out),
        Subelement::QuotedString(quoted) => compose_quoted(quoted, config, out),
        Subelement::PlainText(text) => out.push_str(text),
        Subelement::Punctuation(c) => out.push(*c),
    }
}

fn compose_quoted(quoted: &QuotedString, config: &Config, out: &mut String) {
    if config.options.keep_quotes {
        out.push(quoted.quote);
        out.push_str(&quoted.text);
        out.push(quoted.quote);
    } else {
        out.push_str(&quoted.text);
    }
}

fn compose_link(link: &Link, out: &mut String) {
    match link {
        Link::External(external) => {
            let target = external.target();
            push_markdown_link(external.text.as_deref().unwrap_or(&target), &target, out);
        }
        Link::Internal(internal) => {
            push_markdown_link(internal.text.as_deref().unwrap_or(&internal.path), &internal.path, out);
        }
        Link::Image(image) => compose_image_link(image, out),
    }
}

/// `[text](target)`. Targets containing spaces go in angle brackets so the
/// link stays valid CommonMark. Brackets in the text are escaped.
fn push_markdown_link(text: &str, target: &str, out: &mut String) {
    out.push('[');
    for c in text.chars() {
        if matches!(c, '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("](");
    if target.contains(' ') {
        out.push('<');
        out.push_str(target);
        out.push('>');
    } else {
        out.push_str(target);
    }
    out.push(')');
}

/// Markdown has no sized or captioned image links, so these become raw HTML.
fn compose_image_link(image: &ImageLink, out: &mut String) {
    out.push_str("<a href='");
    out.push_str(&image.href());
    out.push_str("'><img src='");
    out.push_str(&image.image_path);
    out.push('\'');
    if let Some(alt) = &image.alt_text {
        out.push_str(" alt='");
        out.push_str(&alt.replace('\'', "&#39;"));
        out.push('\'');
    }
    if let Some(size) = &image.size {
        out.push(' ');
        out.push_str(size);
    }
    out.push_str(" /></a>");
}

fn compose_macro(found: &Macro, config: &Config, out: &mut String) {
    match found {
        Macro::Include(include) => {
            let params = include.params_text();
            out.push_str(&apply_template(
                &config.macros.include,
                &[("path", &include.page_path), ("params", &params)],
            ));
        }
        Macro::Div(DivMacro::Open(classes)) => {
            if classes.contains(&DivClass::Center) {
                out.push_str(r#"<div class="center">"#);
            } else {
                out.push_str("<div>");
            }
        }
        Macro::Div(DivMacro::Close) => out.push_str("</div>"),
        Macro::TableOfContents(toc) => match toc.max_depth {
            Some(depth) => out.push_str(&apply_template(
                &config.macros.table_of_contents_depth,
                &[("depth", &depth.to_string())],
            )),
            None => out.push_str(&config.macros.table_of_contents),
        },
    }
}

/// Replace `{name}` placeholders. Unknown placeholders are left alone.
fn apply_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut result = template.replace("\\n", "\n");
    for (name, value) in values {
        result = result.replace(&format!("{{{name}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_document, parse_exact, Rule};
    use pretty_assertions::assert_eq;

    fn render(rule: Rule, input: &str) -> String {
        compose(&parse_exact(rule, input).unwrap(), &Config::default())
    }

    fn render_doc(input: &str, config: &Config) -> String {
        compose_document(&parse_document(input, false).unwrap(), config)
    }

    #[test]
    fn test_passthrough_nodes() {
        assert_eq!(render(Rule::PlainText, " OK DOKE "), " OK DOKE ");
        assert_eq!(render(Rule::Punctuation, "."), ".");
        assert_eq!(render(Rule::QuotedString, "'Jump'"), "Jump");
    }

    #[test]
    fn test_keep_quotes() {
        let mut config = Config::default();
        config.options.keep_quotes = true;
        assert_eq!(render_doc("Say 'hi' now\n", &config), "Say 'hi' now\n");
        assert_eq!(render_doc("Say 'hi' now\n", &Config::default()), "Say hi now\n");
    }

    #[test]
    fn test_header() {
        assert_eq!(render(Rule::SectionHeader, "= Heading 1 =\n"), "# Heading 1\n");
        assert_eq!(render(Rule::SectionHeader, "=== Deep ===\n"), "### Deep\n");
        assert_eq!(render(Rule::SectionHeader, "======= Too deep =======\n"), "###### Too deep\n");
    }

    #[test]
    fn test_link_without_text_reuses_target() {
        assert_eq!(render(Rule::Link, "[[http://x.com]]"), "[http://x.com](http://x.com)");
        assert_eq!(render(Rule::Link, "[[CloudMan]]"), "[CloudMan](CloudMan)");
    }

    #[test]
    fn test_link_with_text() {
        assert_eq!(render(Rule::Link, "[[http://x.com|Label]]"), "[Label](http://x.com)");
        assert_eq!(
            render(Rule::Link, "[[Admin/License|License]]"),
            "[License](Admin/License)"
        );
    }

    #[test]
    fn test_link_target_with_space() {
        assert_eq!(
            render(Rule::Link, "[[FrontPage/Use Galaxy]]"),
            "[FrontPage/Use Galaxy](<FrontPage/Use Galaxy>)"
        );
    }

    #[test]
    fn test_image_link_as_html() {
        assert_eq!(
            render(Rule::Link, "[[search/getgalaxy|{{attachment:GetGalaxySearch.png}}]]"),
            "<a href='search/getgalaxy'><img src='GetGalaxySearch.png' /></a>"
        );
        assert_eq!(
            render(
                Rule::Link,
                r#"[[http://gt.g/gy|{{attachment:Is/L/G.png|s a|width="120"}}]]"#
            ),
            r#"<a href='http://gt.g/gy'><img src='Is/L/G.png' alt='s a' width="120" /></a>"#
        );
    }

    #[test]
    fn test_macros() {
        assert_eq!(
            render(Rule::Macro, "<<Include(FrontPage/Use Galaxy)>>"),
            "INCLUDE(FrontPage/Use Galaxy)"
        );
        assert_eq!(
            render(Rule::Macro, r#"<<Include(/Includes, , from="x")>>"#),
            r#"INCLUDE(/Includes, , from="x")"#
        );
        assert_eq!(render(Rule::Macro, "<<TableOfContents>>"), "TABLE_OF_CONTENTS");
        assert_eq!(render(Rule::Macro, "<<TableOfContents(2)>>"), "TABLE_OF_CONTENTS(2)");
        assert_eq!(render(Rule::Macro, "<<div(center)>>"), r#"<div class="center">"#);
        assert_eq!(render(Rule::Macro, "<<div(solid blue)>>"), "<div>");
        assert_eq!(render(Rule::Macro, "<<div>>"), "</div>");
    }

    #[test]
    fn test_macro_templates_from_config() {
        let config = Config::from_toml(
            r#"
[macros]
include = "{{% include \"{path}\" %}}"
table_of_contents = "[TOC]"
table_of_contents_depth = "[TOC depth={depth}]"
"#,
        )
        .unwrap();
        assert_eq!(
            render_doc("<<Include(Dev/Box)>>\n<<TableOfContents>>\n<<TableOfContents(3)>>\n", &config),
            "{{% include \"Dev/Box\" %}}\n[TOC]\n[TOC depth=3]\n"
        );
    }

    #[test]
    fn test_nested_list_indentation() {
        let input = " * top\n   * nested\n     * deeper\n * back\n";
        assert_eq!(
            render_doc(input, &Config::default()),
            "* top\n  * nested\n    * deeper\n* back\n"
        );
        let mut flat = Config::default();
        flat.lists.nested = false;
        assert_eq!(render_doc(input, &flat), "* top\n* nested\n* deeper\n* back\n");
    }

    #[test]
    fn test_list_levels_follow_depth_changes_not_space_counts() {
        let config = Config::default();
        assert_eq!(
            render_doc(" * a\n  * b\n   * c\n", &config),
            "* a\n  * b\n    * c\n"
        );
        assert_eq!(render_doc(" * a\n       * b\n", &config), "* a\n  * b\n");
        assert_eq!(
            render_doc(" * a\n     * b\n   * c\n * d\n", &config),
            "* a\n  * b\n  * c\n* d\n"
        );
    }

    #[test]
    fn test_link_text_brackets_are_escaped() {
        assert_eq!(render(Rule::Link, "[[Page|a]b]]"), r"[a\]b](Page)");
        assert_eq!(render(Rule::Link, "[[Page|[draft] notes]]"), r"[\[draft\] notes](Page)");
    }

    #[test]
    fn test_image_alt_apostrophe_is_escaped() {
        assert_eq!(
            render(Rule::Link, "[[P|{{attachment:x.png|Bob's pic}}]]"),
            "<a href='P'><img src='x.png' alt='Bob&#39;s pic' /></a>"
        );
    }

    #[test]
    fn test_unmatched_quote_does_not_span_lines() {
        assert_eq!(render_doc("Don't\nstop'\n", &Config::default()), "Don't\nstop'\n");
    }

    #[test]
    fn test_list_item_children_in_order() {
        assert_eq!(
            render(Rule::BulletListItem, " * [[/GetGalaxy|Install own Galaxy]] now.\n"),
            "* [Install own Galaxy](/GetGalaxy) now.\n"
        );
    }

    #[test]
    fn test_trailing_whitespace_is_one_newline() {
        assert_eq!(render(Rule::TrailingWhitespace, " \t\n"), "\n");
    }

    #[test]
    fn test_document_concatenates_in_order() {
        let input = "= Title =\nIntro [[http://x.com|X]].\n\n * a\n<<TableOfContents>>\n";
        assert_eq!(
            render_doc(input, &Config::default()),
            "# Title\nIntro [X](http://x.com).\n\n* a\nTABLE_OF_CONTENTS\n"
        );
    }

    #[test]
    fn test_compose_document_node_matches_compose_document() {
        let input = "= T =\n * x\n";
        let doc = parse_document(input, false).unwrap();
        assert_eq!(
            compose(&Node::Document(doc.clone()), &Config::default()),
            compose_document(&doc, &Config::default())
        );
    }
}
