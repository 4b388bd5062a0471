//! Grammar engine for MoinMoin markup.
//!
//! Every rule is a method that tries to match at a byte offset and returns the
//! node plus the offset where the match ended. A failed rule returns
//! `Failure::Mismatch` and has consumed nothing; callers recover by trying the
//! next alternative in priority order (`first_of`) or by ending a repetition
//! (`many`). In strict mode a construct that opened but could not be completed
//! returns `Failure::Fatal`, which no combinator recovers from.

use std::fmt;

use crate::ast::*;
use crate::error::{RuleMismatch, TranslateError, Unsupported};
use crate::source;

/// Grammar rules, named after the constructs they recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    PlainText,
    Punctuation,
    QuotedString,
    PagePath,
    LinkProtocol,
    ExternalLink,
    InternalLink,
    ImageLink,
    Link,
    NamedMacroParameter,
    EmptyMacroParameter,
    IncludeMacroParameter,
    IncludeMacro,
    DivMacro,
    TocMacro,
    Macro,
    SectionHeader,
    BulletListItem,
    BulletList,
    Subelement,
    Paragraph,
    TrailingWhitespace,
    Element,
    Document,
}

impl Rule {
    /// All rules, leaf-most first.
    pub const ALL: [Rule; 24] = [
        Rule::PlainText,
        Rule::Punctuation,
        Rule::QuotedString,
        Rule::PagePath,
        Rule::LinkProtocol,
        Rule::ExternalLink,
        Rule::InternalLink,
        Rule::ImageLink,
        Rule::Link,
        Rule::NamedMacroParameter,
        Rule::EmptyMacroParameter,
        Rule::IncludeMacroParameter,
        Rule::IncludeMacro,
        Rule::DivMacro,
        Rule::TocMacro,
        Rule::Macro,
        Rule::SectionHeader,
        Rule::BulletListItem,
        Rule::BulletList,
        Rule::Subelement,
        Rule::Paragraph,
        Rule::TrailingWhitespace,
        Rule::Element,
        Rule::Document,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::PlainText => "PlainText",
            Rule::Punctuation => "Punctuation",
            Rule::QuotedString => "QuotedString",
            Rule::PagePath => "PagePath",
            Rule::LinkProtocol => "LinkProtocol",
            Rule::ExternalLink => "ExternalLink",
            Rule::InternalLink => "InternalLink",
            Rule::ImageLink => "ImageLink",
            Rule::Link => "Link",
            Rule::NamedMacroParameter => "NamedMacroParameter",
            Rule::EmptyMacroParameter => "EmptyMacroParameter",
            Rule::IncludeMacroParameter => "IncludeMacroParameter",
            Rule::IncludeMacro => "IncludeMacro",
            Rule::DivMacro => "DivMacro",
            Rule::TocMacro => "TOCMacro",
            Rule::Macro => "Macro",
            Rule::SectionHeader => "SectionHeader",
            Rule::BulletListItem => "BulletListItem",
            Rule::BulletList => "BulletList",
            Rule::Subelement => "Subelement",
            Rule::Paragraph => "Paragraph",
            Rule::TrailingWhitespace => "TrailingWhitespace",
            Rule::Element => "Element",
            Rule::Document => "Document",
        }
    }

    /// Case-insensitive lookup by name, for command-line use.
    pub fn from_name(name: &str) -> Option<Rule> {
        Rule::ALL
            .into_iter()
            .find(|rule| rule.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a whole page. Nothing but a page the grammar cannot make progress on
/// fails; in strict mode structural and unsupported constructs fail too.
pub fn parse_document(src: &str, strict: bool) -> Result<Document, TranslateError> {
    let parser = Parser { src, strict };
    let (elements, end) = match parser.many(0, Parser::element) {
        Ok(matched) => matched,
        Err(Failure::Fatal(e)) => return Err(e),
        Err(Failure::Mismatch(m)) => return Err(parser.unrecognized(m.offset)),
    };
    if end < src.len() {
        return Err(parser.unrecognized(end));
    }
    tracing::debug!(elements = elements.len(), bytes = src.len(), "parsed document");
    Ok(Document { elements })
}

/// Match `rule` against a prefix of `text`, returning the node and the number
/// of bytes consumed.
pub fn parse_rule(rule: Rule, text: &str) -> Result<(Node, usize), RuleMismatch> {
    let parser = Parser {
        src: text,
        strict: false,
    };
    match parser.node(rule, 0) {
        Ok(matched) => Ok(matched),
        Err(Failure::Mismatch(m)) => Err(m),
        // Lenient parsing never aborts.
        Err(Failure::Fatal(_)) => Err(RuleMismatch { rule, offset: 0 }),
    }
}

/// Match `rule` against the whole of `text`.
pub fn parse_exact(rule: Rule, text: &str) -> Result<Node, RuleMismatch> {
    let (node, consumed) = parse_rule(rule, text)?;
    if consumed == text.len() {
        Ok(node)
    } else {
        Err(RuleMismatch {
            rule,
            offset: consumed,
        })
    }
}

enum Failure {
    Mismatch(RuleMismatch),
    Fatal(TranslateError),
}

/// A successful match yields the value and the offset just past it.
type PResult<T> = Result<(T, usize), Failure>;

type Alternative<'a, T> = fn(&Parser<'a>, usize) -> PResult<T>;

fn map<T, U>(result: PResult<T>, f: impl FnOnce(T) -> U) -> PResult<U> {
    result.map(|(value, end)| (f(value), end))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_plain(c: char) -> bool {
    is_word(c) || matches!(c, ' ' | '\t' | '\x0b' | '\x0c')
}

fn is_punctuation(c: char) -> bool {
    !is_word(c) && !c.is_whitespace()
}

fn is_path(c: char) -> bool {
    is_word(c) || matches!(c, ' ' | '.' | '#' | '/')
}

struct Parser<'a> {
    src: &'a str,
    strict: bool,
}

impl<'a> Parser<'a> {
    fn rest(&self, at: usize) -> &'a str {
        &self.src[at..]
    }

    fn mismatch(&self, rule: Rule, offset: usize) -> Failure {
        Failure::Mismatch(RuleMismatch { rule, offset })
    }

    fn unrecognized(&self, offset: usize) -> TranslateError {
        let (line, column) = source::locate(self.src, offset);
        TranslateError::UnrecognizedConstruct {
            offset,
            line,
            column,
            remaining: source::remaining_line(self.src, offset),
        }
    }

    fn unsupported(&self, construct: Unsupported, offset: usize) -> Failure {
        let (line, column) = source::locate(self.src, offset);
        Failure::Fatal(TranslateError::UnsupportedConstruct {
            construct,
            offset,
            line,
            column,
        })
    }

    /// Past this point the construct starting at `start` must complete. In
    /// strict mode a mismatch becomes a structural failure.
    fn commit<T>(&self, rule: Rule, start: usize, result: PResult<T>) -> PResult<T> {
        match result {
            Err(Failure::Mismatch(_)) if self.strict => {
                let (line, column) = source::locate(self.src, start);
                Err(Failure::Fatal(TranslateError::StructuralInconsistency {
                    rule,
                    offset: start,
                    line,
                    column,
                    remaining: source::remaining_line(self.src, start),
                }))
            }
            other => other,
        }
    }

    fn first_of<T>(&self, rule: Rule, at: usize, alternatives: &[Alternative<'a, T>]) -> PResult<T> {
        for alternative in alternatives {
            match alternative(self, at) {
                Err(Failure::Mismatch(_)) => continue,
                decided => return decided,
            }
        }
        Err(self.mismatch(rule, at))
    }

    /// Zero or more matches, greedily. Only a fatal failure escapes.
    fn many<T>(&self, at: usize, item: Alternative<'a, T>) -> PResult<Vec<T>> {
        let mut items = Vec::new();
        let mut pos = at;
        loop {
            match item(self, pos) {
                Ok((value, end)) if end > pos => {
                    items.push(value);
                    pos = end;
                }
                Ok(_) | Err(Failure::Mismatch(_)) => break,
                Err(fatal) => return Err(fatal),
            }
        }
        Ok((items, pos))
    }

    /// One or more matches.
    fn some<T>(&self, rule: Rule, at: usize, item: Alternative<'a, T>) -> PResult<Vec<T>> {
        let (items, end) = self.many(at, item)?;
        if items.is_empty() {
            return Err(self.mismatch(rule, at));
        }
        Ok((items, end))
    }

    fn literal(&self, rule: Rule, at: usize, expected: &str) -> Result<usize, Failure> {
        if self.rest(at).starts_with(expected) {
            Ok(at + expected.len())
        } else {
            Err(self.mismatch(rule, at))
        }
    }

    fn take_while(&self, at: usize, pred: impl Fn(char) -> bool) -> usize {
        let rest = self.rest(at);
        at + rest.find(|c: char| !pred(c)).unwrap_or(rest.len())
    }

    fn skip_whitespace(&self, at: usize) -> usize {
        self.take_while(at, char::is_whitespace)
    }

    fn at_line_start(&self, at: usize) -> bool {
        at == 0 || self.src.as_bytes()[at - 1] == b'\n'
    }

    fn node(&self, rule: Rule, at: usize) -> PResult<Node> {
        match rule {
            Rule::PlainText => map(self.plain_text(at), Node::PlainText),
            Rule::Punctuation => map(self.punctuation(at), Node::Punctuation),
            Rule::QuotedString => map(self.quoted_string(at), Node::QuotedString),
            Rule::PagePath => map(self.page_path(at), Node::PagePath),
            Rule::LinkProtocol => map(self.link_protocol(at), Node::LinkProtocol),
            Rule::ExternalLink => map(self.external_link(at), |l| Node::Link(Link::External(l))),
            Rule::InternalLink => map(self.internal_link(at), |l| Node::Link(Link::Internal(l))),
            Rule::ImageLink => map(self.image_link(at), |l| Node::Link(Link::Image(l))),
            Rule::Link => map(self.link(at), Node::Link),
            Rule::NamedMacroParameter => {
                map(self.with_raw(at, self.named_param(at)), Node::IncludeParam)
            }
            Rule::EmptyMacroParameter => {
                map(self.with_raw(at, self.empty_param(at)), Node::IncludeParam)
            }
            Rule::IncludeMacroParameter => map(self.include_param(at), Node::IncludeParam),
            Rule::IncludeMacro => map(self.include_macro(at), |m| Node::Macro(Macro::Include(m))),
            Rule::DivMacro => map(self.div_macro(at), |m| Node::Macro(Macro::Div(m))),
            Rule::TocMacro => map(self.toc_macro(at), |m| Node::Macro(Macro::TableOfContents(m))),
            Rule::Macro => map(self.macro_(at), Node::Macro),
            Rule::SectionHeader => map(self.section_header(at), Node::SectionHeader),
            Rule::BulletListItem => map(self.bullet_list_item(at), Node::BulletListItem),
            Rule::BulletList => map(self.bullet_list(at), Node::BulletList),
            Rule::Subelement => map(self.subelement(at), Node::Subelement),
            Rule::Paragraph => map(self.paragraph(at), Node::Paragraph),
            Rule::TrailingWhitespace => map(self.trailing_whitespace(at), |()| Node::TrailingWhitespace),
            Rule::Element => map(self.element(at), Node::Element),
            Rule::Document => map(self.many(at, Parser::element), |elements| {
                Node::Document(Document { elements })
            }),
        }
    }

    // ---------------------------------------------------------------
    // Basic text
    // ---------------------------------------------------------------

    /// A run of word characters, spaces and tabs.
    fn plain_text(&self, at: usize) -> PResult<String> {
        let end = self.take_while(at, is_plain);
        if end == at {
            return Err(self.mismatch(Rule::PlainText, at));
        }
        Ok((self.src[at..end].to_string(), end))
    }

    /// Exactly one character that is neither a word character nor whitespace.
    fn punctuation(&self, at: usize) -> PResult<char> {
        match self.rest(at).chars().next() {
            Some(c) if is_punctuation(c) => Ok((c, at + c.len_utf8())),
            _ => Err(self.mismatch(Rule::Punctuation, at)),
        }
    }

    /// `'text'` or `"text"`: at least one character, closed by the first
    /// matching quote on the same line.
    ///
    /// Moin's migration grammar lets a quoted string run across newlines. Here
    /// a newline ends the attempt, so an unmatched apostrophe stays punctuation
    /// instead of pulling the following lines into one string.
    fn quoted_string(&self, at: usize) -> PResult<QuotedString> {
        let quote = match self.rest(at).chars().next() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.mismatch(Rule::QuotedString, at)),
        };
        let body_start = at + 1;
        for (i, c) in self.rest(body_start).char_indices() {
            if c == '\n' {
                break;
            }
            if c == quote && i > 0 {
                let text = self.src[body_start..body_start + i].to_string();
                return Ok((QuotedString { quote, text }, body_start + i + 1));
            }
        }
        Err(self.mismatch(Rule::QuotedString, at))
    }

    /// Page names: word characters, spaces, periods, hashes and slashes.
    fn page_path(&self, at: usize) -> PResult<String> {
        let end = self.take_while(at, is_path);
        if end == at {
            return Err(self.mismatch(Rule::PagePath, at));
        }
        Ok((self.src[at..end].to_string(), end))
    }

    // ---------------------------------------------------------------
    // Links
    // ---------------------------------------------------------------

    fn link_protocol(&self, at: usize) -> PResult<LinkProtocol> {
        const PROTOCOLS: [(&str, Scheme); 3] = [
            ("https://", Scheme::Https),
            ("http://", Scheme::Http),
            ("ftp://", Scheme::Ftp),
        ];
        let rest = self.rest(at);
        for (prefix, scheme) in PROTOCOLS {
            if let Some(candidate) = rest.get(..prefix.len()) {
                if candidate.eq_ignore_ascii_case(prefix) {
                    let text = candidate.to_string();
                    return Ok((LinkProtocol { scheme, text }, at + prefix.len()));
                }
            }
        }
        Err(self.mismatch(Rule::LinkProtocol, at))
    }

    /// Display text after `|`: everything up to the first `]]` on the line.
    fn link_text(&self, rule: Rule, at: usize) -> PResult<String> {
        let rest = self.rest(at);
        let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
        match line.find("]]") {
            Some(len) if len > 0 => Ok((line[..len].to_string(), at + len)),
            _ => Err(self.mismatch(rule, at)),
        }
    }

    /// `("|" link_text)?`
    fn optional_link_text(&self, rule: Rule, at: usize) -> (Option<String>, usize) {
        let Ok(after_bar) = self.literal(rule, at, "|") else {
            return (None, at);
        };
        match self.link_text(rule, after_bar) {
            Ok((text, end)) => (Some(text), end),
            Err(_) => (None, at),
        }
    }

    fn link(&self, at: usize) -> PResult<Link> {
        let alternatives: [Alternative<'a, Link>; 3] = [
            |p, at| map(p.image_link(at), Link::Image),
            |p, at| map(p.external_link(at), Link::External),
            |p, at| map(p.internal_link(at), Link::Internal),
        ];
        let result = self.first_of(Rule::Link, at, &alternatives);
        if self.rest(at).starts_with("[[") {
            return self.commit(Rule::Link, at, result);
        }
        result
    }

    fn external_link(&self, at: usize) -> PResult<ExternalLink> {
        let pos = self.literal(Rule::ExternalLink, at, "[[")?;
        let (protocol, pos) = self.link_protocol(pos)?;
        let (path, pos) = self.page_path(pos)?;
        let (text, pos) = self.optional_link_text(Rule::ExternalLink, pos);
        let end = self.literal(Rule::ExternalLink, pos, "]]")?;
        Ok((ExternalLink { protocol, path, text }, end))
    }

    fn internal_link(&self, at: usize) -> PResult<InternalLink> {
        let pos = self.literal(Rule::InternalLink, at, "[[")?;
        let pos = self.skip_whitespace(pos);
        let (path, pos) = self.page_path(pos)?;
        let (text, pos) = self.optional_link_text(Rule::InternalLink, pos);
        let end = self.literal(Rule::InternalLink, pos, "]]")?;
        Ok((InternalLink { path, text }, end))
    }

    /// The `|{{attachment:` marker comes after the link target, so this has to
    /// be tried before the plain link forms.
    fn image_link(&self, at: usize) -> PResult<ImageLink> {
        let pos = self.literal(Rule::ImageLink, at, "[[")?;
        let (protocol, pos) = match self.link_protocol(pos) {
            Ok((protocol, end)) => (Some(protocol), end),
            Err(_) => (None, pos),
        };
        let (link_path, pos) = self.page_path(pos)?;
        let pos = self.literal(Rule::ImageLink, pos, "|{{attachment:")?;
        let tail = self.image_tail(pos);
        let ((image_path, alt_text, size), end) = self.commit(Rule::ImageLink, at, tail)?;
        Ok((
            ImageLink {
                protocol,
                link_path,
                image_path,
                alt_text,
                size,
            },
            end,
        ))
    }

    /// `image_path ("|" alt? ("|" size)?)? "}}" "]]"`
    #[allow(clippy::type_complexity)]
    fn image_tail(&self, at: usize) -> PResult<(String, Option<String>, Option<String>)> {
        let (image_path, mut pos) = self.page_path(at)?;
        let mut alt_text = None;
        let mut size = None;
        if let Ok(after_bar) = self.literal(Rule::ImageLink, pos, "|") {
            let alt_end = self.take_while(after_bar, |c| !matches!(c, '}' | '|' | '\n'));
            alt_text = Some(self.src[after_bar..alt_end].to_string()).filter(|s| !s.is_empty());
            pos = alt_end;
            if let Ok(after_bar) = self.literal(Rule::ImageLink, pos, "|") {
                let size_end = self.take_while(after_bar, |c| !matches!(c, '}' | '\n'));
                size = Some(self.src[after_bar..size_end].to_string()).filter(|s| !s.is_empty());
                pos = size_end;
            }
        }
        let pos = self.literal(Rule::ImageLink, pos, "}}")?;
        let end = self.literal(Rule::ImageLink, pos, "]]")?;
        Ok(((image_path, alt_text, size), end))
    }

    // ---------------------------------------------------------------
    // Macros
    // ---------------------------------------------------------------

    fn macro_(&self, at: usize) -> PResult<Macro> {
        let pos = self.literal(Rule::Macro, at, "<<")?;
        let body = self.macro_body(pos);
        self.commit(Rule::Macro, at, body)
    }

    fn macro_body(&self, at: usize) -> PResult<Macro> {
        let alternatives: [Alternative<'a, Macro>; 3] = [
            |p, at| map(p.toc_macro(at), Macro::TableOfContents),
            |p, at| map(p.include_macro(at), Macro::Include),
            |p, at| map(p.div_macro(at), Macro::Div),
        ];
        let (found, pos) = self.first_of(Rule::Macro, at, &alternatives)?;
        let end = self.literal(Rule::Macro, pos, ">>")?;
        Ok((found, end))
    }

    /// `TableOfContents` or `TableOfContents(3)`.
    fn toc_macro(&self, at: usize) -> PResult<TocMacro> {
        let pos = self.literal(Rule::TocMacro, at, "TableOfContents")?;
        let Ok(after_paren) = self.literal(Rule::TocMacro, pos, "(") else {
            return Ok((TocMacro { max_depth: None }, pos));
        };
        let depth = self.toc_depth(after_paren);
        match self.commit(Rule::TocMacro, at, depth) {
            Ok((max_depth, end)) => Ok((
                TocMacro {
                    max_depth: Some(max_depth),
                },
                end,
            )),
            Err(Failure::Mismatch(_)) => Ok((TocMacro { max_depth: None }, pos)),
            Err(fatal) => Err(fatal),
        }
    }

    fn toc_depth(&self, at: usize) -> PResult<u32> {
        let digits_end = self.take_while(at, |c| c.is_ascii_digit());
        let depth = self.src[at..digits_end]
            .parse::<u32>()
            .map_err(|_| self.mismatch(Rule::TocMacro, at))?;
        let end = self.literal(Rule::TocMacro, digits_end, ")")?;
        Ok((depth, end))
    }

    /// `Include(Page/Path, params...)`
    fn include_macro(&self, at: usize) -> PResult<IncludeMacro> {
        let pos = self.literal(Rule::IncludeMacro, at, "Include(")?;
        let body = self.include_body(pos);
        self.commit(Rule::IncludeMacro, at, body)
    }

    fn include_body(&self, at: usize) -> PResult<IncludeMacro> {
        let pos = self.skip_whitespace(at);
        let (page_path, pos) = self.page_path(pos)?;
        let pos = self.skip_whitespace(pos);
        let (params, pos) = self.many(pos, Parser::include_param)?;
        let end = self.literal(Rule::IncludeMacro, pos, ")")?;
        Ok((IncludeMacro { page_path, params }, end))
    }

    fn include_param(&self, at: usize) -> PResult<IncludeParam> {
        let alternatives: [Alternative<'a, IncludeParamKind>; 3] = [
            Parser::named_param,
            Parser::empty_param,
            Parser::whitespace_param,
        ];
        let kind = self.first_of(Rule::IncludeMacroParameter, at, &alternatives);
        self.with_raw(at, kind)
    }

    fn with_raw(&self, at: usize, kind: PResult<IncludeParamKind>) -> PResult<IncludeParam> {
        kind.map(|(kind, end)| {
            let raw = self.src[at..end].to_string();
            (IncludeParam { kind, raw }, end)
        })
    }

    /// `, name = "value"`
    fn named_param(&self, at: usize) -> PResult<IncludeParamKind> {
        let pos = self.literal(Rule::NamedMacroParameter, at, ",")?;
        let pos = self.skip_whitespace(pos);
        let name_end = self.take_while(pos, is_word);
        if name_end == pos {
            return Err(self.mismatch(Rule::NamedMacroParameter, at));
        }
        let name = self.src[pos..name_end].to_string();
        let pos = self.skip_whitespace(name_end);
        let pos = self.literal(Rule::NamedMacroParameter, pos, "=")?;
        let pos = self.skip_whitespace(pos);
        let (value, end) = self
            .quoted_string(pos)
            .map_err(|_| self.mismatch(Rule::NamedMacroParameter, at))?;
        Ok((IncludeParamKind::Named { name, value }, end))
    }

    fn empty_param(&self, at: usize) -> PResult<IncludeParamKind> {
        let end = self.literal(Rule::EmptyMacroParameter, at, ",")?;
        Ok((IncludeParamKind::Empty, end))
    }

    fn whitespace_param(&self, at: usize) -> PResult<IncludeParamKind> {
        let end = self.skip_whitespace(at);
        if end == at {
            return Err(self.mismatch(Rule::IncludeMacroParameter, at));
        }
        Ok((IncludeParamKind::Whitespace, end))
    }

    /// `div`, `div(center)`, `div(center other)`.
    fn div_macro(&self, at: usize) -> PResult<DivMacro> {
        let pos = self.literal(Rule::DivMacro, at, "div")?;
        let Ok(after_paren) = self.literal(Rule::DivMacro, pos, "(") else {
            return Ok((DivMacro::Close, pos));
        };
        match self.commit(Rule::DivMacro, at, self.div_classes(after_paren)) {
            Ok((classes, end)) => Ok((DivMacro::Open(classes), end)),
            Err(Failure::Mismatch(_)) => Ok((DivMacro::Close, pos)),
            Err(fatal) => Err(fatal),
        }
    }

    fn div_classes(&self, at: usize) -> PResult<Vec<DivClass>> {
        let mut classes = Vec::new();
        let mut pos = at;
        loop {
            let name_end = self.take_while(pos, is_word);
            if name_end == pos {
                return Err(self.mismatch(Rule::DivMacro, pos));
            }
            classes.push(match &self.src[pos..name_end] {
                "center" => DivClass::Center,
                other => DivClass::Reserved(other.to_string()),
            });
            let after_space = self.skip_whitespace(name_end);
            if let Ok(end) = self.literal(Rule::DivMacro, after_space, ")") {
                return Ok((classes, end));
            }
            if after_space == name_end {
                return Err(self.mismatch(Rule::DivMacro, name_end));
            }
            pos = after_space;
        }
    }

    // ---------------------------------------------------------------
    // Block structure
    // ---------------------------------------------------------------

    /// `== Name ==` alone on its line. The closing run must have the same
    /// length as the opening one and must end the line.
    fn section_header(&self, at: usize) -> PResult<SectionHeader> {
        let miss = || self.mismatch(Rule::SectionHeader, at);
        let rest = self.rest(at);
        let line_len = rest.find('\n').ok_or_else(miss)?;
        let line = &rest[..line_len];

        let depth = line.bytes().take_while(|&b| b == b'=').count();
        let closing = line.bytes().rev().take_while(|&b| b == b'=').count();
        if depth == 0 || closing != depth || depth + closing >= line.len() {
            return Err(miss());
        }
        let inner = &line[depth..line.len() - closing];
        if !inner.starts_with(' ') || !inner.ends_with(' ') {
            return Err(miss());
        }
        let name = inner.trim_matches(' ');
        if name.is_empty() {
            return Err(miss());
        }
        Ok((
            SectionHeader {
                depth,
                name: name.to_string(),
            },
            at + line_len + 1,
        ))
    }

    /// `<spaces>* content\n`
    fn bullet_list_item(&self, at: usize) -> PResult<BulletListItem> {
        let bullet = self.take_while(at, |c| c == ' ');
        let depth = bullet - at;
        let pos = self.literal(Rule::BulletListItem, bullet, "*")?;
        let content_start = self.take_while(pos, |c| c == ' ');
        if content_start == pos {
            return Err(self.mismatch(Rule::BulletListItem, at));
        }
        let (content, pos) = self
            .some(Rule::BulletListItem, content_start, Parser::subelement)
            .map_err(|failure| match failure {
                Failure::Mismatch(_) => self.mismatch(Rule::BulletListItem, at),
                fatal => fatal,
            })?;
        let pos = self.take_while(pos, |c| c == ' ');
        let end = self
            .literal(Rule::BulletListItem, pos, "\n")
            .map_err(|_| self.mismatch(Rule::BulletListItem, at))?;
        Ok((BulletListItem { depth, content }, end))
    }

    fn bullet_list(&self, at: usize) -> PResult<BulletList> {
        map(self.some(Rule::BulletList, at, Parser::bullet_list_item), |items| {
            BulletList { items }
        })
    }

    fn subelement(&self, at: usize) -> PResult<Subelement> {
        if self.strict && self.rest(at).starts_with("''") {
            return Err(self.unsupported(Unsupported::BoldItalic, at));
        }
        let alternatives: [Alternative<'a, Subelement>; 5] = [
            |p, at| map(p.macro_(at), Subelement::Macro),
            |p, at| map(p.link(at), Subelement::Link),
            |p, at| map(p.quoted_string(at), Subelement::QuotedString),
            |p, at| map(p.plain_text(at), Subelement::PlainText),
            |p, at| map(p.punctuation(at), Subelement::Punctuation),
        ];
        self.first_of(Rule::Subelement, at, &alternatives)
    }

    fn paragraph(&self, at: usize) -> PResult<Paragraph> {
        map(self.some(Rule::Paragraph, at, Parser::subelement), |content| {
            Paragraph { content }
        })
    }

    /// Blanks up to and including a newline.
    fn trailing_whitespace(&self, at: usize) -> PResult<()> {
        let pos = self.take_while(at, |c| matches!(c, ' ' | '\t' | '\x0b' | '\x0c'));
        let end = self
            .literal(Rule::TrailingWhitespace, pos, "\n")
            .map_err(|_| self.mismatch(Rule::TrailingWhitespace, at))?;
        Ok(((), end))
    }

    fn element(&self, at: usize) -> PResult<Element> {
        if self.strict && self.at_line_start(at) {
            self.reject_unsupported_line(at)?;
        }
        let alternatives: [Alternative<'a, Element>; 5] = [
            |p, at| map(p.section_header(at), Element::SectionHeader),
            |p, at| map(p.bullet_list(at), Element::BulletList),
            |p, at| map(p.macro_(at), Element::Macro),
            |p, at| map(p.paragraph(at), Element::Paragraph),
            |p, at| map(p.trailing_whitespace(at), |()| Element::TrailingWhitespace),
        ];
        self.first_of(Rule::Element, at, &alternatives)
    }

    /// Table rows (`||`) and ordered list items (` 1. `) have no grammar.
    fn reject_unsupported_line(&self, at: usize) -> Result<(), Failure> {
        let rest = self.rest(at);
        if rest.starts_with("||") {
            return Err(self.unsupported(Unsupported::Table, at));
        }
        let indent = rest.len() - rest.trim_start_matches(' ').len();
        let after_indent = &rest[indent..];
        let digits = after_indent.len() - after_indent.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if indent > 0 && digits > 0 && after_indent[digits..].starts_with(". ") {
            return Err(self.unsupported(Unsupported::OrderedList, at));
        }
        Ok(())
    }
}
