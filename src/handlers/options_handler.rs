use axum::{response::IntoResponse, Json};

use crate::models::field::FieldType;
use crate::models::relationship::{FetchType, RelationshipKind};

/// 表单下拉框的可选值
pub async fn list_options() -> impl IntoResponse {
    Json(serde_json::json!({
        "fieldTypes": FieldType::ALL,
        "relationshipTypes": RelationshipKind::ALL,
        "fetchTypes": FetchType::ALL,
    }))
}
