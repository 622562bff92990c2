//! The html-strip cleaning strategy: regex tag surgery with
//! structured-data preservation.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extract the bodies of `<script type="application/ld+json">` blocks.
///
/// Many job boards embed the entire posting as Schema.org `JobPosting`
/// JSON. Script removal would discard it, so it is captured first and
/// prepended to the cleaned output.
pub(crate) fn json_ld_blocks(html: &str) -> Vec<String> {
    let pattern = Regex::new(
        r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#,
    )
    .unwrap();

    pattern
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Remove `<script>` and `<style>` blocks entirely, bodies included.
/// `<noscript>` is untouched; its contents survive the later tag strip.
fn remove_script_and_style(html: &str) -> String {
    let script = Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap();
    let style = Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap();

    let text = script.replace_all(html, "");
    style.replace_all(&text, "").into_owned()
}

/// Strip HTML tags, keeping list and paragraph structure readable.
pub(crate) fn strip_tags(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let li_open = Regex::new(r"(?i)<li[^>]*>").unwrap();
    let block_close = Regex::new(r"(?i)</(?:li|p|div|br)[^>]*>").unwrap();
    let br = Regex::new(r"(?i)<br\s*/?>").unwrap();
    let any_tag = Regex::new(r"<[^>]+>").unwrap();

    let text = li_open.replace_all(html, "\u{2022} ");
    let text = block_close.replace_all(&text, "\n");
    let text = br.replace_all(&text, "\n");
    let text = any_tag.replace_all(&text, " ");

    let text = decode_entities(&text);
    let text = normalize_bullets(&text);
    normalize_whitespace(&text)
}

/// Decode the handful of HTML entities that survive tag stripping.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Unify bullet glyphs and dash/asterisk list markers.
fn normalize_bullets(text: &str) -> String {
    let glyphs = Regex::new(r"[\u{25CF}\u{25CB}\u{25E6}\u{25AA}\u{25B8}\u{25BA}\u{25C6}\u{2605}\u{2726}\u{2713}\u{2714}\u{2192}\u{2023}\u{2043}]").unwrap();
    let dash_marker = Regex::new(r"(?m)^[-\u{2013}\u{2014}]\s").unwrap();
    let star_marker = Regex::new(r"(?m)^\*\s").unwrap();

    let text = glyphs.replace_all(text, "\u{2022}");
    let text = dash_marker.replace_all(&text, "\u{2022} ");
    star_marker.replace_all(&text, "\u{2022} ").into_owned()
}

/// Collapse whitespace: CRLF to LF, horizontal runs to one space,
/// blank-line runs to one newline.
pub fn normalize_whitespace(text: &str) -> String {
    let horizontal = Regex::new(r"[ \t]+").unwrap();
    let line_edges = Regex::new(r"(?m)^ +| +$").unwrap();
    let blank_lines = Regex::new(r"\n{2,}").unwrap();

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = horizontal.replace_all(&text, " ");
    let text = line_edges.replace_all(&text, "");
    let text = blank_lines.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Extract readable text from a full HTML page.
///
/// JSON-LD structured data is preserved ahead of the page text; script
/// and style blocks are discarded whole; remaining tags are stripped.
/// Empty input yields an empty string, and tagless text passes through
/// unchanged apart from whitespace normalization.
pub fn clean_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let json_ld = json_ld_blocks(html).join("\n");
    let without_blocks = remove_script_and_style(html);
    let text = strip_tags(&without_blocks);

    if json_ld.is_empty() {
        text
    } else if text.is_empty() {
        json_ld
    } else {
        format!("{json_ld}\n{text}")
    }
}

/// Shape statistics for a cleaned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMetadata {
    pub character_count: usize,
    pub word_count: usize,
    pub line_count: usize,
    pub has_contact_info: bool,
}

/// Compute shape statistics for diagnostics and gate messages.
pub fn metadata(text: &str) -> TextMetadata {
    TextMetadata {
        character_count: text.chars().count(),
        word_count: text.split_whitespace().count(),
        line_count: text.lines().count(),
        has_contact_info: has_contact_patterns(text),
    }
}

fn has_contact_patterns(text: &str) -> bool {
    let email = Regex::new(r"[\w.-]+@[\w.-]+\.\w+").unwrap();
    let phone = Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap();
    email.is_match(text) || phone.is_match(text)
}

/// Max consecutive non-alphanumeric characters before text is treated
/// as corrupted (binary garbage, encoding damage).
const MAX_CONSECUTIVE_SPECIAL_CHARS: usize = 20;

/// Corruption heuristic: a long run of special characters means the
/// input was not meaningful text.
pub fn looks_corrupted(text: &str) -> bool {
    let pattern = format!(
        r"[^a-zA-Z0-9\s]{{{},}}",
        MAX_CONSECUTIVE_SPECIAL_CHARS + 1
    );
    Regex::new(&pattern).unwrap().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(clean_html(""), "");
        assert_eq!(clean_html("   \n "), "");
    }

    #[test]
    fn plain_text_passes_through() {
        let text = "Senior Rust Engineer\n\u{2022} Write Rust\n\u{2022} Review code";
        assert_eq!(clean_html(text), text);
    }

    #[test]
    fn cleaning_is_idempotent_on_clean_text() {
        let once = clean_html("<p>Staff  Engineer</p><ul><li>Ship</li><li>Mentor</li></ul>");
        let twice = clean_html(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn script_and_style_bodies_are_excluded() {
        let html = r#"
            <html><head>
            <style type="text/css">.nav { color: red; } SECRETSTYLE</style>
            <script src="app.js">var SECRETSCRIPT = "tracking";
            function f() { return 1; }</script>
            </head><body><p>Visible body text</p></body></html>
        "#;
        let cleaned = clean_html(html);
        assert!(!cleaned.contains("SECRETSCRIPT"));
        assert!(!cleaned.contains("SECRETSTYLE"));
        assert!(!cleaned.contains("color: red"));
        assert!(cleaned.contains("Visible body text"));
    }

    #[test]
    fn json_ld_survives_even_when_body_is_empty() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@type":"JobPosting","title":"Backend Engineer","description":"Build APIs"}
            </script>
            </head><body></body></html>
        "#;
        let cleaned = clean_html(html);
        assert!(cleaned.contains("Backend Engineer"));
        assert!(cleaned.contains("Build APIs"));
    }

    #[test]
    fn json_ld_is_prepended_before_page_text() {
        let html = r#"
            <script type='application/ld+json'>{"title":"Data Engineer"}</script>
            <p>Apply now</p>
        "#;
        let cleaned = clean_html(html);
        let json_pos = cleaned.find("Data Engineer").unwrap();
        let body_pos = cleaned.find("Apply now").unwrap();
        assert!(json_pos < body_pos);
    }

    #[test]
    fn noscript_contents_are_preserved() {
        let html = "<body><noscript>Enable JavaScript to apply. Role: Platform Engineer</noscript></body>";
        let cleaned = clean_html(html);
        assert!(cleaned.contains("Platform Engineer"));
    }

    #[test]
    fn list_items_become_bullets_and_blocks_become_lines() {
        let html = "<ul><li>Design systems</li><li>Own delivery</li></ul><p>Hybrid role</p>";
        let cleaned = clean_html(html);
        assert!(cleaned.contains("\u{2022} Design systems"));
        assert!(cleaned.contains("\u{2022} Own delivery"));
        assert!(cleaned.contains("Hybrid role"));
    }

    #[test]
    fn entities_are_decoded() {
        let cleaned = clean_html("<p>Sales&nbsp;&amp;&nbsp;Marketing</p>");
        assert_eq!(cleaned, "Sales & Marketing");
    }

    #[test]
    fn whitespace_runs_collapse() {
        let cleaned = normalize_whitespace("a \t b\r\n\r\n\r\nc   d");
        assert_eq!(cleaned, "a b\nc d");
    }

    #[test]
    fn metadata_counts_and_contact_detection() {
        let meta = metadata("Reach us at jobs@acme.com\nLine two");
        assert_eq!(meta.line_count, 2);
        assert_eq!(meta.word_count, 6);
        assert!(meta.has_contact_info);

        assert!(!metadata("no contact here").has_contact_info);
    }

    #[test]
    fn corruption_heuristic_flags_special_char_runs() {
        assert!(looks_corrupted(&"#@!$%".repeat(10)));
        assert!(!looks_corrupted("Normal posting text, $120,000 - $150,000."));
    }

    proptest! {
        #[test]
        fn script_bodies_never_survive(body in "[a-zA-Z0-9 ]{1,80}") {
            let marker = format!("ZXQ{body}QXZ");
            let html = format!(
                "<p>Intro</p><script>{marker}</script><style>{marker}</style><p>Outro</p>"
            );
            let cleaned = clean_html(&html);
            prop_assert!(!cleaned.contains(&marker));
            prop_assert!(cleaned.contains("Intro"));
            prop_assert!(cleaned.contains("Outro"));
        }
    }
}
