//! The readability cleaning strategy: main-content extraction with a
//! whole-document strip fallback and salary-token repair.

use regex::Regex;
use std::io::Cursor;
use tracing::debug;
use url::Url;

use super::strip;

/// Below this many characters the readability output is considered a
/// failed extraction and the whole document falls back to html-strip.
const READABILITY_MIN_CHARS: usize = 100;

/// Base URL used when the caller has none (pasted or stored content).
/// Readability only needs it to resolve relative links.
const FALLBACK_BASE_URL: &str = "http://localhost/";

/// Clean a full HTML document via main-content extraction.
///
/// Boilerplate removal can silently drop salary figures that sit in a
/// stripped footer or disclosure block, so grouped dollar amounts
/// present in the source but absent from the extracted article are
/// prepended as a synthetic `Compensation:` line. JSON-LD blocks are
/// preserved exactly as in the html-strip path, ahead of the article
/// text.
pub fn clean_readable(html: &str, base_url: Option<&Url>) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let url = base_url.cloned().unwrap_or_else(|| {
        Url::parse(FALLBACK_BASE_URL).expect("fallback base URL is valid")
    });

    let mut cursor = Cursor::new(html.as_bytes());
    let article = match readability::extractor::extract(&mut cursor, &url) {
        Ok(product) if product.text.chars().count() >= READABILITY_MIN_CHARS => product.text,
        Ok(product) => {
            debug!(
                chars = product.text.chars().count(),
                "readability output too short, falling back to html-strip"
            );
            return strip::clean_html(html);
        }
        Err(e) => {
            debug!(error = %e, "readability extraction failed, falling back to html-strip");
            return strip::clean_html(html);
        }
    };

    let article = strip::normalize_whitespace(&article);
    let mut sections: Vec<String> = Vec::with_capacity(3);

    let json_ld = strip::json_ld_blocks(html).join("\n");
    if !json_ld.is_empty() {
        sections.push(json_ld);
    }

    let missing = missing_salary_tokens(html, &article);
    if !missing.is_empty() {
        debug!(amounts = ?missing, "restoring dollar amounts dropped by readability");
        sections.push(format!("Compensation: {}", missing.join(", ")));
    }

    sections.push(article);
    sections.join("\n")
}

/// Grouped dollar amounts (`$128,000` style) present in `html` but
/// absent from `article`, in source order, deduplicated.
fn missing_salary_tokens(html: &str, article: &str) -> Vec<String> {
    let dollar = Regex::new(r"\$\d{1,3}(?:,\d{3})+(?:\.\d+)?").unwrap();

    let mut seen = Vec::new();
    for m in dollar.find_iter(html) {
        let token = m.as_str();
        if !article.contains(token) && !seen.iter().any(|s| s == token) {
            seen.push(token.to_string());
        }
    }
    seen
}
