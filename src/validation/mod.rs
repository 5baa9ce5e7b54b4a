//! Per-kind answer validators.
//!
//! Every validator is pure and total: it either returns the typed answer or the
//! reason the raw value was rejected. Skip markers never reach these functions;
//! the registry resolves them against `Node::required` first.

use crate::condition::parse_date;
use crate::data::{AnswerValue, FileRef};
use crate::error::ValidationError;
use crate::flow::{ChoiceConfig, DateConfig, EmailConfig, FileConfig, Node, NumberConfig, TextConfig};
use regex::Regex;
use serde_json::Value as Json;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

fn expect_string<'a>(node: &Node, raw: &'a Json, expected: &str) -> Result<&'a str, ValidationError> {
    raw.as_str().ok_or_else(|| ValidationError::InvalidFormat {
        node_id: node.id.clone(),
        expected: expected.to_string(),
    })
}

pub fn validate_text(
    node: &Node,
    config: &TextConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let text = expect_string(node, raw, "text")?;
    if node.required && text.trim().is_empty() {
        return Err(ValidationError::Required(node.id.clone()));
    }
    if let Some(max_length) = config.max_length {
        if text.chars().count() > max_length {
            return Err(ValidationError::TooLong {
                node_id: node.id.clone(),
                max_length,
            });
        }
    }
    Ok(AnswerValue::Text(text.to_string()))
}

pub fn validate_email(
    node: &Node,
    _config: &EmailConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let email = expect_string(node, raw, "email address")?.trim();
    if node.required && email.is_empty() {
        return Err(ValidationError::Required(node.id.clone()));
    }
    if email.len() > 254 || !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            node_id: node.id.clone(),
            expected: "email address".to_string(),
        });
    }
    Ok(AnswerValue::Email(email.to_string()))
}

pub fn validate_number(
    node: &Node,
    config: &NumberConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let parsed = match raw {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let value = parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber(node.id.clone()))?;

    let below = config.min.is_some_and(|min| value < min);
    let above = config.max.is_some_and(|max| value > max);
    if below || above {
        let bound = |b: Option<f64>, open: &str| {
            b.map(|v| crate::condition::Value::Number(v).to_string())
                .unwrap_or_else(|| open.to_string())
        };
        return Err(ValidationError::OutOfRange {
            node_id: node.id.clone(),
            value,
            min: bound(config.min, "-inf"),
            max: bound(config.max, "inf"),
        });
    }
    Ok(AnswerValue::Number(value))
}

pub fn validate_choice(
    node: &Node,
    config: &ChoiceConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let choice = expect_string(node, raw, "option")?;
    if config.options.iter().any(|o| o == choice) {
        Ok(AnswerValue::Choice(choice.to_string()))
    } else {
        Err(ValidationError::InvalidOption {
            node_id: node.id.clone(),
            value: choice.to_string(),
        })
    }
}

pub fn validate_date(
    node: &Node,
    _config: &DateConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let invalid = || ValidationError::InvalidDate {
        node_id: node.id.clone(),
        value: raw.as_str().map(str::to_string).unwrap_or_else(|| raw.to_string()),
    };
    let text = raw.as_str().ok_or_else(invalid)?;
    parse_date(text).map(AnswerValue::Date).ok_or_else(invalid)
}

pub fn validate_file(
    node: &Node,
    config: &FileConfig,
    raw: &Json,
) -> Result<AnswerValue, ValidationError> {
    let violation = |reason: String| ValidationError::FileConstraintViolation {
        node_id: node.id.clone(),
        reason,
    };

    let file = match raw {
        Json::String(handle) if config.is_unconstrained() => FileRef {
            handle: handle.clone(),
            size_bytes: 0,
            content_type: String::new(),
        },
        Json::String(_) => {
            return Err(violation(
                "a file reference with size and content type is required".to_string(),
            ));
        }
        Json::Object(_) => serde_json::from_value::<FileRef>(raw.clone())
            .map_err(|e| violation(format!("malformed file reference: {}", e)))?,
        other => return Err(violation(format!("expected a file reference, found {}", other))),
    };

    if file.handle.trim().is_empty() {
        return Err(violation("file handle is empty".to_string()));
    }
    if let Some(max) = config.max_size_bytes {
        if file.size_bytes > max {
            return Err(violation(format!(
                "file is {} bytes, the limit is {} bytes",
                file.size_bytes, max
            )));
        }
    }
    if !config.allowed_types.is_empty()
        && !config
            .allowed_types
            .iter()
            .any(|allowed| content_type_matches(allowed, &file.content_type))
    {
        return Err(violation(format!(
            "content type '{}' is not one of {}",
            file.content_type,
            config.allowed_types.join(", ")
        )));
    }
    Ok(AnswerValue::File(file))
}

/// `image/*` matches any `image/...` type; everything else must match exactly.
fn content_type_matches(allowed: &str, actual: &str) -> bool {
    let actual = actual.trim().to_ascii_lowercase();
    let allowed = allowed.trim().to_ascii_lowercase();
    match allowed.strip_suffix("/*") {
        Some(family) => actual
            .split_once('/')
            .is_some_and(|(actual_family, _)| actual_family == family),
        None => allowed == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_content_types() {
        assert!(content_type_matches("image/*", "image/png"));
        assert!(content_type_matches("application/pdf", "Application/PDF"));
        assert!(!content_type_matches("image/*", "imagefoo"));
        assert!(!content_type_matches("image/*", "video/mp4"));
    }

    #[test]
    fn email_pattern_requires_domain_with_dot() {
        assert!(EMAIL_PATTERN.is_match("x@y.com"));
        assert!(EMAIL_PATTERN.is_match("first.last+tag@sub.example.org"));
        assert!(!EMAIL_PATTERN.is_match("x@y"));
        assert!(!EMAIL_PATTERN.is_match("@y.com"));
        assert!(!EMAIL_PATTERN.is_match("x@@y.com"));
        assert!(!EMAIL_PATTERN.is_match("x y@z.com"));
    }
}
