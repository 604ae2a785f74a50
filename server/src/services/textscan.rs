//! Keyword-based text scan (spec §4.10, component C4.10).
//!
//! A thin, stateless collaborator: no cryptographic machinery of its own
//! beyond the MAC envelope it gets wrapped in by the route handler. Two
//! ordered keyword lists, compiled once into case-insensitive
//! word-boundary regexes; first blocking match wins, then first warning
//! match, else safe.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One outcome severity, matching the wire's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Safe,
    Warning,
    Blocked,
}

/// `{"severity": ..., "reason"?: ..., "matchedKeyword"?: ...}` (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDetail {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "matchedKeyword")]
    pub matched_keyword: Option<String>,
}

/// `{"status": "safe"|"warning"|"blocked", "detail": ScanDetail}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub status: String,
    pub detail: ScanDetail,
}

struct Keyword {
    pattern: Regex,
    word: &'static str,
}

fn compile(words: &[&'static str]) -> Vec<Keyword> {
    words
        .iter()
        .map(|&word| {
            let escaped = regex::escape(word);
            let pattern = Regex::new(&format!(r"(?i)\b{escaped}\b")).expect("keyword pattern is always valid regex");
            Keyword { pattern, word }
        })
        .collect()
}

/// Compiled blocking and warning keyword lists.
pub struct TextScanner {
    blocking: Vec<Keyword>,
    warning: Vec<Keyword>,
}

impl TextScanner {
    /// Build the default scanner with this service's keyword lists.
    pub fn new() -> Self {
        Self {
            blocking: compile(&["ransomware", "exfiltrate", "keylogger"]),
            warning: compile(&["exploit", "phishing", "malware"]),
        }
    }

    /// Scan `text`, returning the first blocking match, else the first
    /// warning match, else `Safe`.
    pub fn scan(&self, text: &str) -> ScanResult {
        for kw in &self.blocking {
            if kw.pattern.is_match(text) {
                return ScanResult {
                    status: "blocked".to_string(),
                    detail: ScanDetail {
                        severity: Severity::Blocked,
                        reason: Some(format!("text contains blocked keyword \"{}\"", kw.word)),
                        matched_keyword: Some(kw.word.to_string()),
                    },
                };
            }
        }
        for kw in &self.warning {
            if kw.pattern.is_match(text) {
                return ScanResult {
                    status: "warning".to_string(),
                    detail: ScanDetail {
                        severity: Severity::Warning,
                        reason: Some(format!("text contains flagged keyword \"{}\"", kw.word)),
                        matched_keyword: Some(kw.word.to_string()),
                    },
                };
            }
        }
        ScanResult {
            status: "safe".to_string(),
            detail: ScanDetail { severity: Severity::Safe, reason: None, matched_keyword: None },
        }
    }
}

impl Default for TextScanner {
    fn default() -> Self {
        Self::new()
    }
}
