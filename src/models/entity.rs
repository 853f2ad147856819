use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::field::FieldDescriptor;
use crate::models::relationship::RelationshipDescriptor;

/// 生成请求的唯一载荷，每次提交重新组装，不做持久化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub entity_name: String,
    pub fields: Vec<FieldDescriptor>,
    pub relationships: Vec<RelationshipDescriptor>,
}

/// 生成器对 /api/generator/generate 的回复。
/// 只按属性读取：缺失或为 null 的字段都按默认值处理，缺少 success 视为失败。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub generated_files: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: HashMap<String, String>,
}

/// 生成器对 /api/generator/validate 的回复
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default, deserialize_with = "null_as_default")]
    pub valid: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_response_parses() {
        let resp: GenerationResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(resp.success);
        assert_eq!(resp.message, None);
        assert!(resp.generated_files.is_empty());
    }

    #[test]
    fn full_response_parses() {
        let resp: GenerationResponse = serde_json::from_value(json!({
            "success": false,
            "message": "Generation failed: disk full",
            "generatedFiles": [],
            "errors": { "error": "Generation failed: disk full" }
        }))
        .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Generation failed: disk full"));
        assert_eq!(resp.errors.len(), 1);
    }

    #[test]
    fn missing_success_reads_as_failure() {
        let resp: GenerationResponse =
            serde_json::from_str(r#"{"message":"Generation failed: x"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Generation failed: x"));
    }

    #[test]
    fn null_members_read_as_empty() {
        let resp: GenerationResponse = serde_json::from_str(
            r#"{"success":true,"message":null,"generatedFiles":null,"errors":null}"#,
        )
        .unwrap();
        assert!(resp.success);
        assert_eq!(resp.message, None);
        assert!(resp.generated_files.is_empty());
        assert!(resp.errors.is_empty());

        let report: ValidationReport =
            serde_json::from_str(r#"{"valid":true,"errors":null,"warnings":null}"#).unwrap();
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn metadata_uses_camel_case_keys() {
        let metadata = EntityMetadata {
            entity_name: "Order".into(),
            fields: vec![],
            relationships: vec![],
        };
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({ "entityName": "Order", "fields": [], "relationships": [] })
        );
    }
}
