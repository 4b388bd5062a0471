use crate::config::{Config, LinkRewrite};
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag};

/// Layer 2: rewrite link destinations in the composed Markdown.
/// Uses pulldown-cmark to locate inline links (so code spans are left alone),
/// then does surgical string replacements to keep everything else byte-for-byte.
pub fn rewrite_markdown(input: &str, config: &Config) -> String {
    match &config.links {
        Some(links) => rewrite_links(input, links),
        None => input.to_string(),
    }
}

fn rewrite_links(input: &str, cfg: &LinkRewrite) -> String {
    // (range_start, range_end, replacement) -- range covers `](dest)`
    let mut replacements: Vec<(usize, usize, String)> = Vec::new();

    for (event, range) in Parser::new_ext(input, Options::empty()).into_offset_iter() {
        let Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url,
            ..
        }) = event
        else {
            continue;
        };
        let Some(new_url) = rewrite_target(&dest_url, cfg) else {
            continue;
        };
        let element = &input[range.clone()];
        if !element.ends_with(')') {
            continue;
        }
        if let Some(dest_start) = element.rfind("](") {
            replacements.push((
                range.start + dest_start,
                range.end,
                format!("]({})", format_destination(&new_url)),
            ));
        }
    }

    let mut result = input.to_string();
    for (start, end, replacement) in replacements.into_iter().rev() {
        result.replace_range(start..end, &replacement);
    }
    result
}

/// New destination for a link target, or None to leave it untouched.
/// Moin subpage links start with `/`; page names from the wiki root do not.
fn rewrite_target(url: &str, cfg: &LinkRewrite) -> Option<String> {
    if !needs_absolutize(url) {
        return None;
    }
    if cfg.subpages_relative && url.starts_with('/') {
        return Some(format!(".{url}"));
    }
    if cfg.make_absolute {
        return Some(make_absolute(&cfg.base_url, url));
    }
    None
}

fn format_destination(url: &str) -> String {
    if url.contains(' ') {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

fn needs_absolutize(url: &str) -> bool {
    !url.contains("://") && !url.starts_with("//") && !url.starts_with('#') && !url.starts_with("./")
}

fn make_absolute(base_url: &str, url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        format!("{base}/{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_links(subpages_relative: bool, make_absolute: bool) -> Config {
        Config {
            links: Some(LinkRewrite {
                subpages_relative,
                make_absolute,
                base_url: "https://wiki.example.org/".to_string(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_link_config_is_passthrough() {
        let input = "[Sub](/Sub) and [Page](Admin/License)\n";
        assert_eq!(rewrite_markdown(input, &Config::default()), input);
    }

    #[test]
    fn test_subpage_links_become_relative() {
        let input = "* [Install own Galaxy](/GetGalaxy)\n";
        let result = rewrite_markdown(input, &config_with_links(true, false));
        assert_eq!(result, "* [Install own Galaxy](./GetGalaxy)\n");
    }

    #[test]
    fn test_root_links_made_absolute() {
        let input = "See [License](Admin/License) here.\n";
        let result = rewrite_markdown(input, &config_with_links(true, true));
        assert_eq!(result, "See [License](https://wiki.example.org/Admin/License) here.\n");
    }

    #[test]
    fn test_subpage_made_absolute_when_not_relative() {
        let input = "[Sub](/Sub)\n";
        let result = rewrite_markdown(input, &config_with_links(false, true));
        assert_eq!(result, "[Sub](https://wiki.example.org/Sub)\n");
    }

    #[test]
    fn test_external_links_untouched() {
        let input = "[X](http://x.com) and [anchor](#top)\n";
        let result = rewrite_markdown(input, &config_with_links(true, true));
        assert_eq!(result, input);
    }

    #[test]
    fn test_destination_with_space_stays_bracketed() {
        let input = "[Use Galaxy](<FrontPage/Use Galaxy>)\n";
        let result = rewrite_markdown(input, &config_with_links(true, true));
        assert_eq!(
            result,
            "[Use Galaxy](<https://wiki.example.org/FrontPage/Use Galaxy>)\n"
        );
    }

    #[test]
    fn test_link_inside_code_not_rewritten() {
        let input = "Use `[text](/path)` in markdown, or [real](/path).\n";
        let result = rewrite_markdown(input, &config_with_links(true, false));
        assert_eq!(result, "Use `[text](/path)` in markdown, or [real](./path).\n");
    }

    #[test]
    fn test_multiple_links_on_one_line() {
        let input = "[a](/A) [b](B) [c](/C)\n";
        let result = rewrite_markdown(input, &config_with_links(true, true));
        assert_eq!(result, "[a](./A) [b](https://wiki.example.org/B) [c](./C)\n");
    }

    #[test]
    fn test_make_absolute() {
        assert_eq!(make_absolute("https://w.org/", "/A"), "https://w.org/A");
        assert_eq!(make_absolute("https://w.org", "A/B"), "https://w.org/A/B");
    }
}
