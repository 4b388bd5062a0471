/// A whole wiki page: top-level elements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    SectionHeader(SectionHeader),
    BulletList(BulletList),
    Macro(Macro),
    Paragraph(Paragraph),
    /// A line holding nothing but blanks; renders as a single newline.
    TrailingWhitespace,
}

/// `== Name ==`. `depth` is the number of `=` on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionHeader {
    pub depth: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulletList {
    pub items: Vec<BulletListItem>,
}

/// ` * text`. `depth` is the count of leading spaces before the `*`.
#[derive(Debug, Clone, PartialEq)]
pub struct BulletListItem {
    pub depth: usize,
    pub content: Vec<Subelement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub content: Vec<Subelement>,
}

/// Inline content of paragraphs and list items.
#[derive(Debug, Clone, PartialEq)]
pub enum Subelement {
    Macro(Macro),
    Link(Link),
    QuotedString(QuotedString),
    PlainText(String),
    Punctuation(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotedString {
    pub quote: char,
    /// Text between the quotes, quote characters excluded.
    pub text: String,
}

/// `http://`, `https://` or `ftp://`, kept as written (the match is case-insensitive).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkProtocol {
    pub scheme: Scheme,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Link {
    Image(ImageLink),
    External(ExternalLink),
    Internal(InternalLink),
}

/// `[[http://host/path|Text]]`
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalLink {
    pub protocol: LinkProtocol,
    pub path: String,
    pub text: Option<String>,
}

impl ExternalLink {
    pub fn target(&self) -> String {
        format!("{}{}", self.protocol.text, self.path)
    }
}

/// `[[Some/Page|Text]]`
#[derive(Debug, Clone, PartialEq)]
pub struct InternalLink {
    pub path: String,
    pub text: Option<String>,
}

/// `[[target|{{attachment:image.png|alt|width="120"}}]]`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageLink {
    pub protocol: Option<LinkProtocol>,
    pub link_path: String,
    pub image_path: String,
    pub alt_text: Option<String>,
    pub size: Option<String>,
}

impl ImageLink {
    pub fn href(&self) -> String {
        match &self.protocol {
            Some(protocol) => format!("{}{}", protocol.text, self.link_path),
            None => self.link_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Macro {
    TableOfContents(TocMacro),
    Include(IncludeMacro),
    Div(DivMacro),
}

/// `<<Include(Page/Path, , from="x")>>`
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeMacro {
    pub page_path: String,
    pub params: Vec<IncludeParam>,
}

impl IncludeMacro {
    /// The parameter list exactly as it appeared after the page path.
    pub fn params_text(&self) -> String {
        self.params.iter().map(|p| p.raw.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncludeParam {
    pub kind: IncludeParamKind,
    /// Source text of the parameter, separators included.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncludeParamKind {
    Named { name: String, value: QuotedString },
    Empty,
    Whitespace,
}

/// `<<div(center)>>` opens, bare `<<div>>` closes.
#[derive(Debug, Clone, PartialEq)]
pub enum DivMacro {
    Open(Vec<DivClass>),
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DivClass {
    Center,
    /// Any other class name. Parsed but not rendered.
    Reserved(String),
}

/// `<<TableOfContents>>` or `<<TableOfContents(2)>>`
#[derive(Debug, Clone, PartialEq)]
pub struct TocMacro {
    pub max_depth: Option<u32>,
}

/// Any node the grammar can produce, one variant per rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    PlainText(String),
    Punctuation(char),
    QuotedString(QuotedString),
    PagePath(String),
    LinkProtocol(LinkProtocol),
    Link(Link),
    IncludeParam(IncludeParam),
    Macro(Macro),
    SectionHeader(SectionHeader),
    BulletListItem(BulletListItem),
    BulletList(BulletList),
    Subelement(Subelement),
    Paragraph(Paragraph),
    TrailingWhitespace,
    Element(Element),
    Document(Document),
}
