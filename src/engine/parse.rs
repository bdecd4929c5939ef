//! 后端 JSON 回复解析
//!
//! 先整体解析；失败时，若回复以 ```json ... ``` 代码块开头则剥离后再解析，
//! 最后退回到原文中第一个 `{` 与最后一个 `}` 之间的片段。字符串值里的代码块不会被剥离。

use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

/// 剥离包裹整段回复的 Markdown 代码块标记；不以代码块开头的文本原样返回（去掉首尾空白）
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };
    // 跳过语言标记（如 json）所在的行
    let body = match rest.find('\n') {
        Some(nl) if rest[..nl].chars().all(|c| c.is_ascii_alphanumeric()) => &rest[nl + 1..],
        _ => rest.trim_start_matches("json"),
    };
    match body.rfind(FENCE) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// 解析为任意 JSON 值
pub fn parse_json_reply(text: &str) -> Result<Value, serde_json::Error> {
    parse_json_as(text)
}

/// 解析为指定结构
pub fn parse_json_as<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let trimmed = text.trim();
    let err = match serde_json::from_str(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    if trimmed.starts_with(FENCE) {
        if let Ok(v) = serde_json::from_str(strip_code_fence(trimmed)) {
            return Ok(v);
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end && (start > 0 || end < trimmed.len() - 1) => {
            serde_json::from_str(&trimmed[start..=end]).map_err(|_| err)
        }
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        assert_eq!(parse_json_reply(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"content\": \"4\"}\n```";
        assert_eq!(parse_json_reply(text).unwrap(), json!({"content": "4"}));
        let text = "```\n{\"content\": \"4\"}\n```";
        assert_eq!(parse_json_reply(text).unwrap(), json!({"content": "4"}));
    }

    #[test]
    fn test_single_line_fence() {
        let text = "```json{\"a\": true}```";
        assert_eq!(parse_json_reply(text).unwrap(), json!({"a": true}));
    }

    #[test]
    fn test_surrounding_prose() {
        let text = "Here is the plan: {\"steps\": []} hope it helps";
        assert_eq!(parse_json_reply(text).unwrap(), json!({"steps": []}));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(parse_json_reply("not json at all").is_err());
        assert!(parse_json_reply("{broken").is_err());
    }

    #[test]
    fn test_non_object_values_parse() {
        assert_eq!(parse_json_reply("[1, 2]").unwrap(), json!([1, 2]));
        assert_eq!(parse_json_reply("42").unwrap(), json!(42));
    }

    #[test]
    fn test_backticks_inside_string_values_are_kept() {
        let text = "{\"content\": \"Use this:\\n```rust\\nfn main() {}\\n```\\nDone.\"}";
        assert_eq!(
            parse_json_reply(text).unwrap(),
            json!({"content": "Use this:\n```rust\nfn main() {}\n```\nDone."})
        );
    }

    #[test]
    fn test_fence_only_stripped_at_start() {
        assert_eq!(strip_code_fence("  {\"a\": \"x ``` y\"} "), "{\"a\": \"x ``` y\"}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_prose_then_fenced_json() {
        let text = "Sure:\n```json\n{\"text\": \"hi\"}\n```";
        assert_eq!(parse_json_reply(text).unwrap(), json!({"text": "hi"}));
    }
}
