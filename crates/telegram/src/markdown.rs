//! Discord-flavored markdown to Telegram HTML.
//!
//! Telegram supports a small HTML subset: `<b>`, `<i>`, `<u>`, `<s>`,
//! `<code>`, `<pre>`, `<a href="">`, `<tg-spoiler>`. Everything else must
//! be escaped or dropped.

/// Escape the three characters Telegram's HTML parse mode rejects in text.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        push_escaped(&mut out, ch);
    }
    out
}

fn push_escaped(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        _ => out.push(ch),
    }
}

/// Convert the Discord markdown subset to Telegram HTML.
///
/// Handles fenced code blocks, inline code, bold, italic, underline,
/// strikethrough, and spoilers. Unpaired markers pass through as literal
/// text.
#[must_use]
pub fn discord_markdown_to_html(src: &str) -> String {
    let mut out = String::with_capacity(src.len() + 16);
    let mut rest = src;
    loop {
        match rest.find("```") {
            Some(start) => {
                out.push_str(&render_inline(&rest[..start]));
                let after = &rest[start + 3..];
                let Some(end) = after.find("```") else {
                    // Unterminated fence: the backticks are literal text.
                    out.push_str(&render_inline(&rest[start..]));
                    break;
                };
                out.push_str("<pre>");
                out.push_str(&escape_html(strip_language_tag(&after[..end])));
                out.push_str("</pre>");
                rest = &after[end + 3..];
            },
            None => {
                out.push_str(&render_inline(rest));
                break;
            },
        }
    }
    out
}

/// Discord fences may open with a language tag (```rust). The tag is a
/// rendering hint, not content; an empty first line is the tagless form
/// of the same thing.
fn strip_language_tag(block: &str) -> &str {
    match block.split_once('\n') {
        Some((first, body)) if first.chars().all(|c| c.is_ascii_alphanumeric()) => body,
        _ => block,
    }
}

// Two-character markers first so "**" never parses as two italic stars.
const MARKERS: &[(&str, &str, &str)] = &[
    ("**", "<b>", "</b>"),
    ("__", "<u>", "</u>"),
    ("~~", "<s>", "</s>"),
    ("||", "<tg-spoiler>", "</tg-spoiler>"),
    ("*", "<i>", "</i>"),
    ("_", "<i>", "</i>"),
    ("`", "<code>", "</code>"),
];

fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if let Some(consumed) = try_render_marker(rest, &mut out) {
            i += consumed;
            continue;
        }
        let Some(ch) = rest.chars().next() else { break };
        push_escaped(&mut out, ch);
        i += ch.len_utf8();
    }
    out
}

/// If `rest` starts with a marker that has a matching closer and a
/// non-empty body, render the span into `out` and return the consumed byte
/// length.
fn try_render_marker(rest: &str, out: &mut String) -> Option<usize> {
    for (marker, open, close) in MARKERS {
        if !rest.starts_with(marker) {
            continue;
        }
        let body_start = marker.len();
        let Some(rel) = rest[body_start..].find(marker) else {
            continue;
        };
        if rel == 0 {
            continue;
        }
        let body = &rest[body_start..body_start + rel];
        out.push_str(open);
        if *marker == "`" {
            out.push_str(&escape_html(body));
        } else {
            out.push_str(&render_inline(body));
        }
        out.push_str(close);
        return Some(body_start + rel + marker.len());
    }
    None
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("plain text", "plain text")]
    #[case("**bold**", "<b>bold</b>")]
    #[case("*ital*", "<i>ital</i>")]
    #[case("_ital_", "<i>ital</i>")]
    #[case("__under__", "<u>under</u>")]
    #[case("~~gone~~", "<s>gone</s>")]
    #[case("||secret||", "<tg-spoiler>secret</tg-spoiler>")]
    #[case("`let x = 1;`", "<code>let x = 1;</code>")]
    #[case("**bold** and *ital*", "<b>bold</b> and <i>ital</i>")]
    fn inline_markers(#[case] src: &str, #[case] expected: &str) {
        assert_eq!(discord_markdown_to_html(src), expected);
    }

    #[test]
    fn nested_markers_render_inside_out() {
        assert_eq!(
            discord_markdown_to_html("**bold _and ital_**"),
            "<b>bold <i>and ital</i></b>"
        );
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            discord_markdown_to_html("a <b> & c"),
            "a &lt;b&gt; &amp; c"
        );
    }

    #[test]
    fn code_spans_escape_but_do_not_format() {
        assert_eq!(
            discord_markdown_to_html("`**x** < y`"),
            "<code>**x** &lt; y</code>"
        );
    }

    #[test]
    fn fenced_block_with_language_tag() {
        assert_eq!(
            discord_markdown_to_html("```rust\nlet a = 1;\n```"),
            "<pre>let a = 1;\n</pre>"
        );
    }

    #[test]
    fn fenced_block_without_language_tag() {
        assert_eq!(
            discord_markdown_to_html("```\nplain\n```"),
            "<pre>plain\n</pre>"
        );
    }

    #[test]
    fn unpaired_markers_are_literal() {
        assert_eq!(discord_markdown_to_html("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(discord_markdown_to_html("a ** b"), "a ** b");
        assert_eq!(discord_markdown_to_html("```py\nno close"), "```py\nno close");
    }

    #[test]
    fn escape_html_handles_all_specials() {
        assert_eq!(escape_html("<&>"), "&lt;&amp;&gt;");
        assert_eq!(escape_html("safe"), "safe");
    }
}
