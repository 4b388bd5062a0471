use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub macros: MacroTemplates,
    #[serde(default)]
    pub lists: ListOptions,
    #[serde(default)]
    pub links: Option<LinkRewrite>,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Options {
    /// Replace no-break spaces, normalize line endings, add a final newline.
    #[serde(default = "default_true")]
    pub normalize_source: bool,
    /// Render quoted strings with their quote characters.
    #[serde(default)]
    pub keep_quotes: bool,
    /// Report structural and unsupported constructs instead of passing them through.
    #[serde(default)]
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            normalize_source: true,
            keep_quotes: false,
            strict: false,
        }
    }
}

/// Placeholder templates for macros that have no Markdown equivalent.
/// `{path}`, `{params}` and `{depth}` are substituted.
#[derive(Debug, Clone, Deserialize)]
pub struct MacroTemplates {
    #[serde(default = "default_include")]
    pub include: String,
    #[serde(default = "default_toc")]
    pub table_of_contents: String,
    #[serde(default = "default_toc_depth")]
    pub table_of_contents_depth: String,
}

impl Default for MacroTemplates {
    fn default() -> Self {
        Self {
            include: default_include(),
            table_of_contents: default_toc(),
            table_of_contents_depth: default_toc_depth(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListOptions {
    /// Indent items by their leading-space depth; false renders every item flush left.
    #[serde(default = "default_true")]
    pub nested: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self { nested: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkRewrite {
    /// Moin subpage links (`/Child`) become `./Child`.
    #[serde(default = "default_true")]
    pub subpages_relative: bool,
    #[serde(default)]
    pub make_absolute: bool,
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub layout: OutputLayout,
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    #[serde(default = "default_target_extension")]
    pub target_extension: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::default(),
            source_extension: default_source_extension(),
            target_extension: default_target_extension(),
        }
    }
}

/// Where a translated page lands relative to the destination root.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `Dir/Page.moin` -> `Dir/Page/index.md`
    #[default]
    IndexDir,
    /// `Dir/Page.moin` -> `Dir/Page.md`
    File,
}

fn default_true() -> bool {
    true
}

fn default_include() -> String {
    "INCLUDE({path}{params})".to_string()
}

fn default_toc() -> String {
    "TABLE_OF_CONTENTS".to_string()
}

fn default_toc_depth() -> String {
    "TABLE_OF_CONTENTS({depth})".to_string()
}

fn default_source_extension() -> String {
    "moin".to_string()
}

fn default_target_extension() -> String {
    "md".to_string()
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }
}
