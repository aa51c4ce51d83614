use std::borrow::Cow;

use quick_xml::escape::resolve_predefined_entity;

/// Ellipsis appended to truncated descriptions
const ELLIPSIS: char = '…';

/// Strips markup from catalog-supplied text and normalizes it for display.
///
/// - Tags (`<p>`, `<br/>`, `<a href=..>`) are removed; each tag boundary acts
///   as whitespace so `a<br>b` becomes `a b`
/// - `<script>` and `<style>` element bodies are dropped entirely
/// - `<` only opens a tag before a letter, `/`, `!` or `?`; `a < b` is text
/// - Character references (`&amp;`, `&#39;`, `&nbsp;`) are decoded one by one;
///   bare `&` and unknown entities are kept verbatim
/// - Control characters are removed and runs of whitespace collapsed
///
/// Returns an empty string when nothing displayable remains.
///
/// # Examples
///
/// ```
/// use podcast_gallery::util::strip_markup;
///
/// assert_eq!(strip_markup("<p>Hello&nbsp;<b>world</b></p>"), "Hello world");
/// assert_eq!(strip_markup("<br/>  "), "");
/// ```
pub fn strip_markup(input: &str) -> String {
    let mut text = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open..];

        // `<` not followed by a tag name or `/`, `!`, `?` is plain text ("a < b")
        let opens_tag = after[1..]
            .starts_with(|c: char| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !opens_tag {
            text.push('<');
            rest = &after[1..];
            continue;
        }

        let Some(close) = after.find('>') else {
            // Unterminated tag: treat the remainder as text
            text.push_str(after);
            rest = "";
            break;
        };

        let tag = after[1..close].to_ascii_lowercase();
        rest = &after[close + 1..];
        text.push(' ');

        for raw_body in ["script", "style"] {
            if tag.starts_with(raw_body) {
                let end_tag = format!("</{raw_body}");
                rest = match rest.to_ascii_lowercase().find(&end_tag) {
                    Some(end) => {
                        let tail = &rest[end..];
                        tail.find('>').map_or("", |gt| &tail[gt + 1..])
                    }
                    None => "",
                };
            }
        }
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    let cleaned = strip_control_chars(&decoded);
    collapse_whitespace(&cleaned)
}

/// Longest reference body considered, e.g. `#x1F600` or `hellip`
const MAX_ENTITY_LEN: usize = 10;

/// Decodes character references one at a time. A bare `&`, an unterminated
/// reference or an unknown name is kept as written.
fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let resolved = after
            .char_indices()
            .take(MAX_ENTITY_LEN + 1)
            .find(|&(_, c)| c == ';')
            .and_then(|(semi, _)| resolve_entity(&after[..semi]).map(|c| (semi, c)));

        match resolved {
            Some((semi, decoded)) => {
                out.push_str(&decoded);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code)
            .filter(|&c| c != '\0')
            .map(|c| Cow::Owned(c.to_string()));
    }

    let named = resolve_predefined_entity(name).or(match name {
        "nbsp" => Some(" "),
        "hellip" => Some("…"),
        "mdash" => Some("—"),
        "ndash" => Some("–"),
        "rsquo" => Some("’"),
        "lsquo" => Some("‘"),
        "rdquo" => Some("”"),
        "ldquo" => Some("“"),
        _ => None,
    });
    named.map(Cow::Borrowed)
}

/// Collapses every run of whitespace to a single space and trims both ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncates `s` to at most `limit` characters, appending an ellipsis when cut.
///
/// The budget counts `char`s, not bytes, so multi-byte text is never split
/// mid-codepoint. Trailing whitespace before the ellipsis is trimmed.
///
/// Returns `Cow::Borrowed` when the text already fits.
///
/// ```
/// use podcast_gallery::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 6), "Hello…");
/// ```
pub fn truncate_chars(s: &str, limit: usize) -> Cow<'_, str> {
    match s.char_indices().nth(limit) {
        None => Cow::Borrowed(s),
        Some((cut, _)) => {
            let mut out = s[..cut].trim_end().to_string();
            out.push(ELLIPSIS);
            Cow::Owned(out)
        }
    }
}

/// Strip ASCII control characters (except tab, newline, carriage return).
///
/// Catalog text ends up inside HTML; C0 controls are not valid there and are
/// dropped. Returns `Cow::Borrowed` when the input is already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| {
        (c < '\u{20}' && c != '\t' && c != '\n' && c != '\r') || c == '\u{7f}'
    };

    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_control(c)).collect())
}
