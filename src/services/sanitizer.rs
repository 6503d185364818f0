//! HTML 白名单清洗
//!
//! 两套策略：
//! - `RichText`: 设置项中的富文本（footer、bio、OG 描述、TikTok 嵌入）
//! - `Embed`: 嵌入块（iframe 为主）
//!
//! 两者都会强制所有 `<a>` 带上 `rel="noopener noreferrer"` 与 `target="_blank"`。

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use ammonia::Builder;

/// 清洗策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RichText,
    Embed,
}

const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "ftp"];

/// Elements whose text content is dropped together with the tag.
const DROP_CONTENT_TAGS: &[&str] = &["script", "style", "textarea", "option", "noscript", "template"];

const IFRAME_ATTRS: &[&str] = &[
    "src",
    "width",
    "height",
    "frameborder",
    "allow",
    "allowfullscreen",
    "scrolling",
    "referrerpolicy",
];

const EMBED_IFRAME_EXTRA_ATTRS: &[&str] = &["title", "loading", "class", "style"];

const RICH_TEXT_TAGS: &[&str] = &[
    "p", "b", "i", "em", "strong", "a", "br", "ul", "ol", "li", "span", "small", "div", "iframe",
];

const EMBED_TAGS: &[&str] = &[
    "iframe", "div", "p", "span", "b", "i", "strong", "em", "a", "br", "small",
];

fn set(items: &[&'static str]) -> HashSet<&'static str> {
    items.iter().copied().collect()
}

fn base_builder(
    tags: &[&'static str],
    tag_attributes: HashMap<&'static str, HashSet<&'static str>>,
) -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .tags(set(tags))
        .tag_attributes(tag_attributes)
        .url_schemes(set(URL_SCHEMES))
        .clean_content_tags(set(DROP_CONTENT_TAGS))
        .strip_comments(true)
        .link_rel(Some("noopener noreferrer"))
        .set_tag_attribute_value("a", "target", "_blank");
    builder
}

static RICH_TEXT: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let attrs = HashMap::from([
        ("a", set(&["href"])),
        ("iframe", set(IFRAME_ATTRS)),
        ("div", set(&["class", "style"])),
        ("span", set(&["class", "style"])),
    ]);
    base_builder(RICH_TEXT_TAGS, attrs)
});

static EMBED: LazyLock<Builder<'static>> = LazyLock::new(|| {
    let iframe: HashSet<&'static str> = IFRAME_ATTRS
        .iter()
        .chain(EMBED_IFRAME_EXTRA_ATTRS)
        .copied()
        .collect();
    let attrs = HashMap::from([
        ("a", set(&["href"])),
        ("iframe", iframe),
        ("div", set(&["class", "style"])),
        ("span", set(&["class", "style"])),
        ("p", set(&["class", "style"])),
    ]);
    base_builder(EMBED_TAGS, attrs)
});

/// 按策略清洗 HTML。不在白名单中的标签和属性被移除（而不是转义）。
pub fn sanitize(raw: &str, policy: Policy) -> String {
    let builder = match policy {
        Policy::RichText => &*RICH_TEXT,
        Policy::Embed => &*EMBED,
    };
    builder.clean(raw).to_string()
}

/// 去除所有标签与注释，得到纯文本
///
/// 标签内引号中的 `>` 不会提前结束标签；结果中的常见实体会被解码。
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let tag = &rest[start..];

        if let Some(comment) = tag.strip_prefix("<!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }

        // "a < b" is text, not a tag
        let opens_tag = tag[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            text.push('<');
            rest = &tag[1..];
            continue;
        }

        let mut quote: Option<char> = None;
        let mut end = None;
        for (i, c) in tag.char_indices().skip(1) {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '>') => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        rest = end.map_or("", |i| &tag[i + 1..]);
    }
    text.push_str(rest);

    unescape(&text)
}

/// 解码基础 HTML 实体，未知实体原样保留
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];
        let decoded = candidate
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&candidate[..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &candidate[semi + 1..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = entity.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_markup_survives() {
        let html = "<p>Hello <b>world</b> and <em>friends</em></p>";
        assert_eq!(sanitize(html, Policy::RichText), html);

        let html = r#"<div class="card" style="color:red"><span>hi</span></div>"#;
        assert_eq!(sanitize(html, Policy::RichText), html);
    }

    #[test]
    fn test_disallowed_tags_are_removed() {
        let cleaned = sanitize("<p>hi<script>alert(1)</script></p>", Policy::RichText);
        assert_eq!(cleaned, "<p>hi</p>");

        let cleaned = sanitize("<h1>Title</h1>", Policy::RichText);
        assert_eq!(cleaned, "Title");

        let cleaned = sanitize(r#"<p onclick="evil()">x</p>"#, Policy::RichText);
        assert_eq!(cleaned, "<p>x</p>");
    }

    #[test]
    fn test_anchor_rel_and_target_are_forced() {
        for policy in [Policy::RichText, Policy::Embed] {
            let cleaned = sanitize(
                r#"<a href="https://example.com" target="_self" rel="opener">x</a>"#,
                policy,
            );
            assert!(cleaned.contains(r#"href="https://example.com""#), "{cleaned}");
            assert!(cleaned.contains(r#"rel="noopener noreferrer""#), "{cleaned}");
            assert!(cleaned.contains(r#"target="_blank""#), "{cleaned}");
            assert!(!cleaned.contains("_self"));
            assert!(!cleaned.contains("\"opener\""));
        }
    }

    #[test]
    fn test_javascript_urls_are_dropped() {
        let cleaned = sanitize(r#"<a href="javascript:alert(1)">x</a>"#, Policy::RichText);
        assert!(!cleaned.contains("javascript"));
    }

    #[test]
    fn test_iframe_attributes() {
        let html = r#"<iframe src="https://www.youtube.com/embed/abc" width="560" height="315" allowfullscreen="" onload="x()"></iframe>"#;
        let cleaned = sanitize(html, Policy::Embed);
        assert!(cleaned.contains(r#"src="https://www.youtube.com/embed/abc""#));
        assert!(cleaned.contains(r#"width="560""#));
        assert!(!cleaned.contains("onload"));
    }

    #[test]
    fn test_policies_differ_on_lists_and_paragraph_style() {
        assert_eq!(sanitize("<ul><li>a</li></ul>", Policy::RichText), "<ul><li>a</li></ul>");
        assert_eq!(sanitize("<ul><li>a</li></ul>", Policy::Embed), "a");

        let styled = r#"<p style="margin:0">x</p>"#;
        assert_eq!(sanitize(styled, Policy::Embed), styled);
        assert_eq!(sanitize(styled, Policy::RichText), "<p>x</p>");
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_tags(r#"<a title="a > b" href="/">link</a>"#), "link");
        assert_eq!(strip_tags("a<!-- hidden -->b"), "ab");
        assert_eq!(strip_tags("1 < 2 &amp; 3 &gt; 2"), "1 < 2 & 3 > 2");
        assert_eq!(strip_tags("unterminated <b"), "unterminated ");
    }

    #[test]
    fn test_unescape_keeps_unknown_entities() {
        assert_eq!(unescape("&#39;q&#x27;"), "'q'");
        assert_eq!(unescape("AT&T &copy;"), "AT&T &copy;");
    }
}
