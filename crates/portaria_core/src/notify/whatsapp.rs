//! Messaging deep-link composition.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

/// Country code prefixed to numbers that do not already carry it.
pub const DEFAULT_COUNTRY_CODE: &str = "55";
const DEEP_LINK_BASE: &str = "https://wa.me/";
const DEFAULT_MESSAGE: &str = "Olá!";

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid non-digit regex"));

/// Strips every non-digit and prefixes the country code when absent.
///
/// Returns `None` when no digits remain.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = NON_DIGIT_RE.replace_all(raw, "");
    if digits.is_empty() {
        return None;
    }
    if digits.starts_with(DEFAULT_COUNTRY_CODE) {
        Some(digits.into_owned())
    } else {
        Some(format!("{DEFAULT_COUNTRY_CODE}{digits}"))
    }
}

/// Builds `https://wa.me/<digits>?text=<message>`.
///
/// A blank message falls back to a plain greeting.
pub fn build_whatsapp_link(phone: &str, message: &str) -> Option<String> {
    let number = normalize_phone(phone)?;
    let text = if message.trim().is_empty() {
        DEFAULT_MESSAGE
    } else {
        message
    };
    let base = Url::parse(DEEP_LINK_BASE).ok()?;
    let mut url = base.join(&number).ok()?;
    url.query_pairs_mut().append_pair("text", text);
    Some(url.to_string())
}
