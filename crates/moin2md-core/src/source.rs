use std::borrow::Cow;

/// Clean up raw page text before parsing: no-break spaces become plain
/// spaces, CRLF and lone CR become LF, and the text ends with a newline.
///
/// Wiki exports are full of U+00A0, which is whitespace but neither a plain
/// text nor a punctuation character, so no rule could ever consume it.
pub fn prepare(input: &str) -> Cow<'_, str> {
    let needs_work = input.contains(['\u{a0}', '\r']) || (!input.is_empty() && !input.ends_with('\n'));
    if !needs_work {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + 1);
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\u{a0}' => out.push(' '),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            _ => out.push(c),
        }
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    Cow::Owned(out)
}

/// 1-based line and column (in characters) of a byte offset.
pub fn locate(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// The rest of the line starting at `offset`, for error messages.
pub fn remaining_line(src: &str, offset: usize) -> String {
    const MAX_CHARS: usize = 60;

    let rest = &src[offset.min(src.len())..];
    let line = rest.split('\n').next().unwrap_or("");
    let mut snippet: String = line.chars().take(MAX_CHARS).collect();
    if line.chars().count() > MAX_CHARS {
        snippet.push_str("...");
    }
    snippet
}
