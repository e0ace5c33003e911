//! Template rendering, validation, and channel constraint checks.
//!
//! Rendering substitutes `{{identifier}}` placeholders from a data map.
//! An identifier absent from the data is left verbatim - a deliberate
//! debug-friendly default rather than a silent blank. Substitution is a
//! single pass (rendered output is not re-scanned) and case-sensitive.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use maru_core::{NotificationTemplate, OrderStatus, RenderedMessage, TemplateChannel};

/// Maximum template body length accepted by [`validate`].
pub const MAX_BODY_CHARS: usize = 1000;
/// FCM title length beyond which a warning is raised.
pub const FCM_SUBJECT_SOFT_LIMIT: usize = 100;
/// FCM body length beyond which a warning is raised.
pub const FCM_BODY_SOFT_LIMIT: usize = 500;
/// Slack body length beyond which the message is rejected.
pub const SLACK_BODY_HARD_LIMIT: usize = 4000;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").expect("valid placeholder pattern")
});

/// Render a template against a data map.
#[must_use]
pub fn render(template: &NotificationTemplate, data: &Map<String, Value>) -> RenderedMessage {
    RenderedMessage {
        subject: template.subject.as_deref().map(|s| substitute(s, data)),
        body: substitute(&template.body, data),
    }
}

fn substitute(input: &str, data: &Map<String, Value>) -> String {
    PLACEHOLDER_RE
        .replace_all(input, |caps: &Captures<'_>| {
            let verbatim = caps.get(0).map_or("", |m| m.as_str());
            let key = caps.get(1).map_or("", |m| m.as_str());
            data.get(key)
                .map_or_else(|| verbatim.to_string(), value_to_string)
        })
        .into_owned()
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Result of validating a template for saving/publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Validate a template: name and body required, body length bounded, and
/// `{{`/`}}` occurrence counts balanced (a total-count check, not a
/// well-formedness check).
#[must_use]
pub fn validate(template: &NotificationTemplate) -> ValidationReport {
    let mut errors = Vec::new();

    if template.name.trim().is_empty() {
        errors.push("name is required".to_string());
    }
    if template.body.is_empty() {
        errors.push("body is required".to_string());
    }
    if template.body.chars().count() > MAX_BODY_CHARS {
        errors.push(format!("body exceeds {MAX_BODY_CHARS} characters"));
    }
    let opens = template.body.matches("{{").count();
    let closes = template.body.matches("}}").count();
    if opens != closes {
        errors.push(format!(
            "unbalanced placeholder braces: {opens} '{{{{' vs {closes} '}}}}'"
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
    }
}

/// Result of checking channel-specific constraints on a rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintReport {
    /// `false` only on hard limits (Slack body overflow); soft limits
    /// stay valid and surface as warnings.
    pub valid: bool,
    pub warnings: Vec<String>,
}

/// Check channel-specific size limits and emoji usage.
#[must_use]
pub fn check_constraints(
    channel: TemplateChannel,
    subject: Option<&str>,
    body: &str,
) -> ConstraintReport {
    let mut warnings = Vec::new();
    let mut valid = true;
    let body_chars = body.chars().count();

    match channel {
        TemplateChannel::Fcm => {
            if let Some(subject) = subject
                && subject.chars().count() > FCM_SUBJECT_SOFT_LIMIT
            {
                warnings.push(format!(
                    "fcm subject over recommended {FCM_SUBJECT_SOFT_LIMIT} characters"
                ));
            }
            if body_chars > FCM_BODY_SOFT_LIMIT {
                warnings.push(format!(
                    "fcm body over recommended {FCM_BODY_SOFT_LIMIT} characters"
                ));
            }
        }
        TemplateChannel::Slack => {
            if body_chars > SLACK_BODY_HARD_LIMIT {
                valid = false;
                warnings.push(format!(
                    "slack body exceeds {SLACK_BODY_HARD_LIMIT} characters"
                ));
            }
        }
    }

    if contains_emoji(body) {
        warnings.push("body contains emoji".to_string());
    }

    ConstraintReport { valid, warnings }
}

/// Default copy used when a template is missing, unpublished, or invalid.
/// Slack carries body-only copy; the FCM family (push and email) gets a
/// subject too.
#[must_use]
pub fn fallback_message(
    channel: TemplateChannel,
    store_name: &str,
    order_number: &str,
    status: OrderStatus,
) -> RenderedMessage {
    let body = format!("[{store_name}] 주문 {order_number} 상태가 {status}(으)로 변경되었습니다.");
    let subject = match channel {
        TemplateChannel::Fcm => Some(format!("{store_name} 주문 알림")),
        TemplateChannel::Slack => None,
    };
    RenderedMessage { subject, body }
}

fn contains_emoji(s: &str) -> bool {
    s.chars().any(|c| {
        matches!(
            u32::from(c),
            0x1F300..=0x1F5FF   // symbols & pictographs
                | 0x1F600..=0x1F64F // emoticons
                | 0x1F680..=0x1F6FF // transport & map
                | 0x1F900..=0x1F9FF // supplemental symbols
                | 0x1FA70..=0x1FAFF // extended-A
                | 0x2600..=0x26FF   // miscellaneous symbols
                | 0x2700..=0x27BF // dingbats
        )
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use maru_core::TemplateStatus;
    use serde_json::json;

    use super::*;

    fn template(body: &str) -> NotificationTemplate {
        NotificationTemplate {
            name: "order.created_ko-KR".to_string(),
            channel: TemplateChannel::Fcm,
            locale: "ko-KR".to_string(),
            subject: None,
            body: body.to_string(),
            status: TemplateStatus::Published,
            updated_at: Utc::now(),
            published_at: Some(Utc::now()),
        }
    }

    fn data(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_known_placeholders() {
        let rendered = render(
            &template("Hi {{name}}"),
            &data(&[("name", json!("Kim"))]),
        );
        assert_eq!(rendered.body, "Hi Kim");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders_verbatim() {
        let rendered = render(&template("Hi {{name}}"), &Map::new());
        assert_eq!(rendered.body, "Hi {{name}}");
    }

    #[test]
    fn test_render_is_not_recursive() {
        // A substituted value containing placeholder syntax is not
        // re-scanned.
        let rendered = render(
            &template("{{a}}"),
            &data(&[("a", json!("{{b}}")), ("b", json!("nope"))]),
        );
        assert_eq!(rendered.body, "{{b}}");
    }

    #[test]
    fn test_render_is_case_sensitive() {
        let rendered = render(&template("{{Name}}"), &data(&[("name", json!("Kim"))]));
        assert_eq!(rendered.body, "{{Name}}");
    }

    #[test]
    fn test_render_stringifies_numbers() {
        let rendered = render(
            &template("{{count}}건"),
            &data(&[("count", json!(3))]),
        );
        assert_eq!(rendered.body, "3건");
    }

    #[test]
    fn test_render_subject() {
        let mut t = template("body");
        t.subject = Some("{{store_name}} 알림".to_string());
        let rendered = render(&t, &data(&[("store_name", json!("마루식당"))]));
        assert_eq!(rendered.subject.as_deref(), Some("마루식당 알림"));
    }

    #[test]
    fn test_validate_requires_name_and_body() {
        let mut t = template("");
        t.name = String::new();
        let report = validate(&t);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_validate_body_length() {
        let report = validate(&template(&"가".repeat(1001)));
        assert!(!report.valid);

        let report = validate(&template(&"가".repeat(1000)));
        assert!(report.valid);
    }

    #[test]
    fn test_validate_brace_balance() {
        let report = validate(&template("{{name} missing close"));
        assert!(!report.valid);

        let report = validate(&template("{{a}} {{b}}"));
        assert!(report.valid);
    }

    #[test]
    fn test_fcm_soft_limits_warn_but_stay_valid() {
        let long_body = "a".repeat(501);
        let report = check_constraints(TemplateChannel::Fcm, None, &long_body);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);

        let long_subject = "s".repeat(101);
        let report = check_constraints(TemplateChannel::Fcm, Some(&long_subject), "ok");
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_slack_hard_limit_fails() {
        let body = "a".repeat(4001);
        let report = check_constraints(TemplateChannel::Slack, None, &body);
        assert!(!report.valid);

        let body = "a".repeat(4000);
        let report = check_constraints(TemplateChannel::Slack, None, &body);
        assert!(report.valid);
    }

    #[test]
    fn test_emoji_warns_on_any_channel() {
        let report = check_constraints(TemplateChannel::Fcm, None, "배송 출발 🚚");
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("emoji")));

        let report = check_constraints(TemplateChannel::Slack, None, "완료 ✅");
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("emoji")));
    }

    #[test]
    fn test_korean_text_is_not_emoji() {
        let report = check_constraints(TemplateChannel::Fcm, None, "주문이 접수되었습니다");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_fallback_message_per_channel() {
        let fcm = fallback_message(TemplateChannel::Fcm, "마루식당", "A-1042", OrderStatus::Ready);
        assert!(fcm.subject.is_some());
        assert!(fcm.body.contains("A-1042"));
        assert!(fcm.body.contains("READY"));

        let slack =
            fallback_message(TemplateChannel::Slack, "마루식당", "A-1042", OrderStatus::Ready);
        assert!(slack.subject.is_none());
    }
}
