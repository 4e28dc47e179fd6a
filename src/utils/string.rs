//! String utilities
//!
//! Message bodies only reach the logs as short previews; these helpers cut
//! them on character boundaries so multi-byte text never panics.

/// Truncate to at most `max_chars` characters
///
/// # Example
/// ```
/// use whatsapp_groq_bot::utils::truncate_str;
///
/// assert_eq!(truncate_str("Olá, mundo", 3), "Olá");
/// assert_eq!(truncate_str("oi", 10), "oi");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate and append `suffix` when something was cut
///
/// # Example
/// ```
/// use whatsapp_groq_bot::utils::truncate_with_suffix;
///
/// assert_eq!(truncate_with_suffix("Bom dia!", 3, "..."), "Bom...");
/// assert_eq!(truncate_with_suffix("Oi", 3, "..."), "Oi");
/// ```
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    let cut = truncate_str(s, max_chars);
    if cut.len() == s.len() {
        s.to_string()
    } else {
        format!("{}{}", cut, suffix)
    }
}
