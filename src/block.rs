use serde_json::Value;

const STATUS_KEYS: &[&str] = &["status", "statusCode", "status_code", "code"];
const BLOCK_STATUSES: &[i64] = &[401, 403, 407, 429];
const MESSAGE_KEYS: &[&str] = &["error", "message", "title"];

const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "access denied",
    "too many requests",
    "robot",
    "비정상적인 접근",
    "로그인이 필요",
    "자동입력 방지",
];

/// Reason string when a payload is an upstream auth/rate-limit/robot page.
pub fn detect_block(payload: &Value) -> Option<String> {
    match payload {
        Value::String(text) => marker_in(text).map(|m| format!("payload contains {m:?}")),
        Value::Object(map) => {
            for key in STATUS_KEYS {
                if let Some(status) = map.get(*key).and_then(status_code)
                    && BLOCK_STATUSES.contains(&status)
                {
                    return Some(format!("{key}={status}"));
                }
            }
            for key in MESSAGE_KEYS {
                if let Some(Value::String(text)) = map.get(*key)
                    && let Some(marker) = marker_in(text)
                {
                    return Some(format!("{key} contains {marker:?}"));
                }
            }
            None
        }
        _ => None,
    }
}

fn status_code(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn marker_in(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    BLOCK_MARKERS
        .iter()
        .copied()
        .find(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn detects_blocked_payloads() {
        let cases = [
            (json!({"status": 403, "message": "forbidden"}), "status=403"),
            (json!({"statusCode": "429"}), "statusCode=429"),
            (json!({"code": 401}), "code=401"),
            (
                json!({"error": "Access Denied by WAF"}),
                "error contains \"access denied\"",
            ),
            (
                json!("<html><title>비정상적인 접근이 감지되었습니다</title></html>"),
                "payload contains \"비정상적인 접근\"",
            ),
            (
                json!({"title": "Please complete the CAPTCHA"}),
                "title contains \"captcha\"",
            ),
        ];
        for (payload, expected) in cases {
            assert_eq!(
                detect_block(&payload).as_deref(),
                Some(expected),
                "payload={payload}"
            );
        }
    }

    #[test]
    fn ordinary_payloads_are_not_blocked() {
        let cases = [
            json!({"status": 200, "items": []}),
            json!({"code": "A100", "title": "역세권 원룸"}),
            json!([{"status": 403}]),
            json!({"data": {"status": 403}}),
            json!("plain text"),
            json!(null),
        ];
        for payload in cases {
            assert_eq!(detect_block(&payload), None, "payload={payload}");
        }
    }
}
