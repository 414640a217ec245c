use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use sha2::{Digest, Sha256};

lazy_static! {
    static ref BEARER_REGEX: Regex = Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").unwrap();
    static ref JWT_REGEX: Regex = Regex::new(r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").unwrap();
    static ref API_KEY_REGEX: Regex = Regex::new(r"\b(?:sk|xi|sb)[-_][A-Za-z0-9_-]{16,}\b").unwrap();
    static ref DATE_REGEX: Regex = Regex::new(r"\b\d{4}-\d{2}-\d{2}\b").unwrap();
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").unwrap();
}

/// PHI and secret redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub redact_secrets: bool,
    pub redact_dates: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub hash_for_correlation: bool,
    pub custom_patterns: Vec<(Regex, String)>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_secrets: true,
            redact_dates: true,
            redact_emails: true,
            redact_phones: true,
            hash_for_correlation: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Add a custom pattern; invalid regexes are rejected
    pub fn with_custom_pattern(mut self, pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        self.custom_patterns.push((Regex::new(pattern)?, replacement.to_string()));
        Ok(self)
    }
}

/// Redactor applied to transcripts, tool arguments and upstream error bodies
/// before they reach a log line.
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Secrets first: a bearer token may itself be a JWT.
        if self.config.redact_secrets {
            result = BEARER_REGEX.replace_all(&result, "Bearer [REDACTED]").to_string();
            result = JWT_REGEX.replace_all(&result, "JWT[REDACTED]").to_string();
            result = API_KEY_REGEX.replace_all(&result, "[REDACTED]").to_string();
        }

        if self.config.redact_dates {
            result = self.redact_with(&DATE_REGEX, "DATE", "****-**-**", &result);
        }

        if self.config.redact_emails {
            result = self.redact_with(&EMAIL_REGEX, "EMAIL", "***@***", &result);
        }

        if self.config.redact_phones {
            result = self.redact_with(&PHONE_REGEX, "PHONE", "(***) ***-****", &result);
        }

        for (pattern, replacement) in &self.config.custom_patterns {
            result = pattern.replace_all(&result, replacement.as_str()).to_string();
        }

        result
    }

    /// Redact a JSON value by rendering it first; used for tool arguments
    pub fn redact_json(&self, value: &impl serde::Serialize) -> String {
        match serde_json::to_string(value) {
            Ok(text) => self.redact(&text),
            Err(_) => "[unserializable]".to_string(),
        }
    }

    fn redact_with(&self, regex: &Regex, label: &str, mask: &str, text: &str) -> String {
        regex
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{}[{}]", label, self.hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD_NO_PAD.encode(&result[..6])
    }
}
