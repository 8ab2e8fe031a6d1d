//! Parse-mode markup → plain text.
//!
//! Telegram limits reply quotes by their length *after* entity parsing, so a
//! quote written in HTML or Markdown has to be measured without its markup.
//! This is a measuring tool, not a validator: malformed markup is stripped on
//! a best-guess basis.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::model::reply::ParseMode;

/// Remove the markup of `mode` from `text`, keeping only the visible characters.
pub fn plain_text(text: &str, mode: ParseMode) -> String {
    match mode {
        ParseMode::Html => strip_html(text),
        ParseMode::MarkdownV2 => strip_markdown(text, true),
        ParseMode::Markdown => strip_markdown(text, false),
    }
}

fn html_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(\s[^>]*)?>").expect("valid regex"))
}

fn html_entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex")
    })
}

fn strip_html(text: &str) -> String {
    let without_tags = html_tag_re().replace_all(text, "");
    unescape_html(&without_tags)
}

/// Decode the HTML entities Telegram accepts (`&lt;`, `&gt;`, `&amp;`, `&quot;`, numeric).
pub fn unescape_html(text: &str) -> String {
    html_entity_re()
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => numeric_entity(name),
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn numeric_entity(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let code = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}

fn strip_markdown(text: &str, v2: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut open_links = 0usize;
    let mut line_start = true;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let was_line_start = line_start;
        line_start = c == '\n';

        match c {
            '\\' if v2 => {
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                    i += 2;
                    continue;
                }
                out.push(c);
            }
            '\\' if matches!(chars.get(i + 1), Some('_' | '*' | '`' | '[')) => {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '`' if chars[i..].starts_with(&['`', '`', '`']) => {
                i = copy_pre(&chars, i + 3, v2, &mut out);
                continue;
            }
            '`' => {
                i = copy_until(&chars, i + 1, '`', v2, &mut out);
                continue;
            }
            '*' | '_' => {}
            '~' | '|' if v2 => {}
            '>' if v2 && was_line_start => {}
            '!' if v2 && chars.get(i + 1) == Some(&'[') => {}
            '[' => open_links += 1,
            ']' if open_links > 0 => {
                open_links -= 1;
                if chars.get(i + 1) == Some(&'(') {
                    i = skip_link_target(&chars, i + 2, v2);
                    continue;
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

/// Copy a fenced block body (after the opening fence), dropping the language line.
fn copy_pre(chars: &[char], start: usize, v2: bool, out: &mut String) -> usize {
    let mut i = start;
    let line_end = chars[i..].iter().position(|c| *c == '\n').map(|p| i + p);
    if let Some(end) = line_end {
        if chars[i..end].iter().all(|c| !c.is_whitespace() && *c != '`') {
            i = end + 1;
        }
    }
    while i < chars.len() {
        if chars[i..].starts_with(&['`', '`', '`']) {
            return i + 3;
        }
        if v2 && chars[i] == '\\' && i + 1 < chars.len() {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    i
}

fn copy_until(chars: &[char], start: usize, close: char, v2: bool, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len() {
        if chars[i] == close {
            return i + 1;
        }
        if v2 && chars[i] == '\\' && i + 1 < chars.len() {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    i
}

fn skip_link_target(chars: &[char], start: usize, v2: bool) -> usize {
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' if v2 => i += 2,
            ')' => return i + 1,
            _ => i += 1,
        }
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_tags_and_entities_are_removed() {
        let s = r#"<b>bold</b> &amp; <a href="https://t.me">link</a> &lt;3 &#128512; &#x41;"#;
        assert_eq!(plain_text(s, ParseMode::Html), "bold & link <3 😀 A");
    }

    #[test]
    fn html_keeps_unknown_entities_literally() {
        assert_eq!(plain_text("a &nbsp; b", ParseMode::Html), "a &nbsp; b");
    }

    #[test]
    fn markdown_v2_formatting_is_removed() {
        let s = r"*bold* _italic_ __under__ ~strike~ ||spoiler|| [link](https://x.y/\)) \*lit\*";
        assert_eq!(
            plain_text(s, ParseMode::MarkdownV2),
            "bold italic under strike spoiler link *lit*"
        );
    }

    #[test]
    fn markdown_v2_code_and_pre_keep_content() {
        let s = "`a*b` ```rust\nfn x() {}\n```";
        assert_eq!(plain_text(s, ParseMode::MarkdownV2), "a*b fn x() {}\n");
    }

    #[test]
    fn markdown_v2_blockquote_and_emoji() {
        let s = ">quoted\n![👍](tg://emoji?id=5368324170671202286)";
        assert_eq!(plain_text(s, ParseMode::MarkdownV2), "quoted\n👍");
    }

    #[test]
    fn legacy_markdown_keeps_tildes() {
        let s = r"*b* _i_ ~t~ \_u\_ [x](http://a)";
        assert_eq!(plain_text(s, ParseMode::Markdown), "b i ~t~ _u_ x");
    }
}
