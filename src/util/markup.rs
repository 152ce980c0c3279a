use std::borrow::Cow;

use quick_xml::escape::unescape;

/// Elements whose bodies are code, not text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements that separate words when their tags are dropped.
const BREAKING_ELEMENTS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6",
    "blockquote", "pre", "hr",
];

/// Longest entity name we try to decode (`&thetasym;` is 10).
const MAX_ENTITY_LEN: usize = 32;

/// Removes HTML markup from feed text.
///
/// Returns the input unchanged (borrowed) unless it contains a tag-like
/// `<...>` pair or a decodable entity. Otherwise tags, comments and the
/// bodies of `<script>`/`<style>` are dropped, CDATA bodies are kept, and
/// entities are decoded. Unknown entities stay as written.
///
/// Never fails: malformed markup such as an unterminated tag is treated as
/// plain text from that point on.
///
/// # Examples
///
/// ```
/// use feedwalk::util::strip_markup;
///
/// assert_eq!(strip_markup("<p>Fish &amp; <b>chips</b></p>"), "Fish & chips");
/// assert_eq!(strip_markup("plain"), "plain");
/// assert_eq!(strip_markup("2 < 3"), "2 < 3");
/// ```
pub fn strip_markup(s: &str) -> Cow<'_, str> {
    if !has_markup(s) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < s.len() {
        let rest = &s[i..];
        let Some(offset) = rest.find(['<', '&']) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..offset]);
        i += offset;
        let rest = &s[i..];

        if rest.starts_with('&') {
            match decode_entity(rest) {
                Some((decoded, len)) => {
                    out.push_str(&decoded);
                    i += len;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            }
            continue;
        }

        if let Some(body) = rest.strip_prefix("<!--") {
            i += 4 + body.find("-->").map_or(body.len(), |end| end + 3);
            continue;
        }

        if let Some(body) = rest.strip_prefix("<![CDATA[") {
            let end = body.find("]]>").unwrap_or(body.len());
            out.push_str(&body[..end]);
            i += 9 + (end + 3).min(body.len());
            continue;
        }

        let Some(close) = tag_end(rest) else {
            out.push('<');
            i += 1;
            continue;
        };

        let name = tag_name(&rest[1..close]);
        i += close + 1;

        if BREAKING_ELEMENTS.contains(&name.as_str()) && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }

        let is_closing = rest[1..].starts_with('/');
        if !is_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            i += skip_raw_text(&s[i..], &name);
        }
    }

    match out.trim() {
        trimmed if trimmed.len() == out.len() => Cow::Owned(out),
        trimmed => Cow::Owned(trimmed.to_string()),
    }
}

/// True if `s` holds a tag-like `<...>` pair or a decodable entity.
fn has_markup(s: &str) -> bool {
    let has_tag = s
        .match_indices('<')
        .any(|(pos, _)| tag_end(&s[pos..]).is_some());
    has_tag
        || s
            .match_indices('&')
            .any(|(pos, _)| decode_entity(&s[pos..]).is_some())
}

/// Byte offset of the `>` closing a tag starting at `s[0] == '<'`.
///
/// Only `<` followed by a letter, `/`, `!` or `?` opens a tag, so prose like
/// `a < b` survives.
fn tag_end(s: &str) -> Option<usize> {
    let next = s[1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || matches!(next, '/' | '!' | '?')) {
        return None;
    }
    s.find('>')
}

/// Lowercased element name of a tag body such as `/P` or `img src="x"`.
fn tag_name(body: &str) -> String {
    body.trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
}

/// Length of a `<script>`/`<style>` body plus its closing tag.
fn skip_raw_text(s: &str, name: &str) -> usize {
    let lower = s.to_ascii_lowercase();
    let closing = format!("</{}", name);
    match lower.find(&closing) {
        Some(start) => s[start..].find('>').map_or(s.len(), |end| start + end + 1),
        None => s.len(),
    }
}

/// Decodes the entity at the start of `s`, returning its text and length.
fn decode_entity(s: &str) -> Option<(Cow<'static, str>, usize)> {
    let semi = s.get(1..)?.find(';')?;
    if semi == 0 || semi > MAX_ENTITY_LEN {
        return None;
    }
    let len = semi + 2;
    let raw = &s[..len];

    // quick-xml covers the XML builtins and numeric references
    if let Ok(decoded) = unescape(raw) {
        return Some((Cow::Owned(decoded.into_owned()), len));
    }
    html_entity(&raw[1..len - 1]).map(|text| (Cow::Borrowed(text), len))
}

/// Named HTML entities that show up in feed text.
fn html_entity(name: &str) -> Option<&'static str> {
    let text = match name {
        "nbsp" => "\u{a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "sbquo" => "\u{201a}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "bdquo" => "\u{201e}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "hellip" => "\u{2026}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "yen" => "\u{a5}",
        "cent" => "\u{a2}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "shy" => "\u{ad}",
        _ => return None,
    };
    Some(text)
}
