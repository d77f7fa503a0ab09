// src/bot/moderation.rs - Message classification against the rule set

use log::debug;
use regex::Regex;

use crate::rules::RuleSet;
use crate::types::Verdict;

/// Matches an http/https link and captures its authority: everything after
/// the scheme up to the first `/`, `?`, or whitespace.
const LINK_PATTERN: &str = r"(?i)https?://([^\s/?]+)";

/// Decides whether a message violates the rule set. Pure: no side effects,
/// no state beyond the compiled link pattern.
pub struct ModerationEngine {
    link_pattern: Regex,
}

impl Default for ModerationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModerationEngine {
    pub fn new() -> Self {
        Self {
            // The pattern is a fixed literal, it always compiles.
            link_pattern: Regex::new(LINK_PATTERN).expect("link pattern compiles"),
        }
    }

    /// Extract candidate domains from free text, lowercased, in order of
    /// appearance. Duplicates are kept; the checks downstream treat each
    /// occurrence independently.
    pub fn extract_domains(&self, text: &str) -> Vec<String> {
        self.link_pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
            .collect()
    }

    /// Evaluate one message against the rule set. First match wins, and the
    /// link check runs before the word check: a forbidden link is the more
    /// severe violation and short-circuits everything else.
    pub fn evaluate(&self, text: &str, rules: &RuleSet) -> Verdict {
        let text = text.to_lowercase();

        if text.contains("http://") || text.contains("https://") {
            let domains = self.extract_domains(&text);
            // A scheme substring with no extractable domain is not a link
            // violation; the message still goes through the word check.
            if let Some(first) = domains.first() {
                let allowed = domains
                    .iter()
                    .any(|domain| rules.allowed_links.iter().any(|a| domain.contains(a.as_str())));
                if !allowed {
                    debug!("Link violation: domain '{}' not whitelisted", first);
                    return Verdict::ForbiddenLink {
                        domain: first.clone(),
                    };
                }
            }
        }

        for word in &rules.forbidden_words {
            if word_matches(&text, word) {
                debug!("Word violation: '{}'", word);
                return Verdict::ForbiddenWord { word: word.clone() };
            }
        }

        Verdict::Clean
    }
}

/// Whole-word match of a literal, already-lowercased word against
/// already-lowercased text. The word is escaped before it is embedded in the
/// boundary pattern, so entries like "a.b" match only themselves.
fn word_matches(text: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let pattern = format!(r"\b{}\b", regex::escape(word));
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}
