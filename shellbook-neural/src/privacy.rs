use regex::Regex;
use std::sync::OnceLock;

/// Strip credentials from prompts before they are sent to the model.
///
/// Hosts, addresses and user names are left alone: they are usually the
/// subject of the request, and commands built around a placeholder break.
pub struct PrivacyGuard;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

fn rules() -> &'static [Rule] {
    RULES.get_or_init(|| {
        // Order matters: bearer headers contain key-shaped tokens.
        [
            (r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]{8,}", "Bearer [REDACTED_TOKEN]"),
            (r"\b(sk-[a-zA-Z0-9]{20,}|gh[pousr]_[a-zA-Z0-9]{20,}|AIza[0-9A-Za-z_-]{30,})\b", "[REDACTED_KEY]"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(pattern) => Some(Rule { pattern, replacement }),
            Err(e) => {
                tracing::error!("Invalid privacy pattern {}: {}", pattern, e);
                None
            }
        })
        .collect()
    })
}

impl PrivacyGuard {
    /// Replace API keys and bearer tokens in the input string.
    pub fn scrub(input: &str) -> String {
        rules().iter().fold(input.to_string(), |text, rule| {
            rule.pattern.replace_all(&text, rule.replacement).into_owned()
        })
    }

    /// True if scrubbing would change the input.
    pub fn is_sensitive(input: &str) -> bool {
        rules().iter().any(|rule| rule.pattern.is_match(input))
    }
}
