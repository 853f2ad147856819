use axum::{extract::{rejection::JsonRejection, State, Path}, Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::AppState;
use crate::error::AppError;
use crate::models::entity::{EntityMetadata, ValidationReport};
use crate::models::field::{FieldRow, FieldRowInput};
use crate::models::notification::{ErrorElement, Notification};
use crate::models::relationship::{RelationshipRow, RelationshipRowInput};
use crate::services::form_controller::{evict_idle, submit_metadata, FormController, SubmitOutcome};
use crate::services::notifier::RecordingNotifier;

#[derive(Deserialize, Default)]
pub struct CreateFormPayload {
    pub origin: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityNamePayload {
    pub entity_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRowView {
    pub not_null_id: String,
    pub primary_key_id: String,
    #[serde(flatten)]
    pub row: FieldRow,
}

impl From<&FieldRow> for FieldRowView {
    fn from(row: &FieldRow) -> Self {
        Self {
            not_null_id: row.not_null_id(),
            primary_key_id: row.primary_key_id(),
            row: row.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: u64,
    pub base_url: String,
    pub docs_link: String,
    pub entity_name: String,
    pub entity_name_error: ErrorElement,
    pub fields: Vec<FieldRowView>,
    pub relationships: Vec<RelationshipRow>,
    pub created_at: DateTime<Utc>,
}

impl FormView {
    fn new(id: u64, form: &FormController) -> Self {
        Self {
            id,
            base_url: form.base_url().to_string(),
            docs_link: form.docs_link().to_string(),
            entity_name: form.entity_name().to_string(),
            entity_name_error: form.entity_name_error().clone(),
            fields: form.field_rows().iter().map(FieldRowView::from).collect(),
            relationships: form.relationship_rows().to_vec(),
            created_at: form.created_at(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
    pub notifications: Vec<Notification>,
    pub entity_name_error: ErrorElement,
}

/// 在会话锁内操作指定的表单。先回收闲置过期的会话，再刷新本会话的活动时间。
async fn with_form<T>(
    state: &AppState,
    id: u64,
    f: impl FnOnce(&mut FormController) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let now = Utc::now();
    let mut forms = state.forms.write().await;
    evict_idle(&mut forms, state.config.form_ttl, now);
    let form = forms.get_mut(&id).ok_or(AppError::FormNotFound(id))?;
    form.touch(now);
    f(form)
}

/// 请求体解析失败时也返回统一的 {error} 结构
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}

/// 1. 打开表单页面 (初始化会话，计算生成器地址和文档链接)
pub async fn create_form(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<CreateFormPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let origin = payload
        .and_then(|Json(p)| p.origin)
        .unwrap_or_else(|| state.config.page_origin.clone());

    let form = FormController::new(&origin, state.config.port_rewrite)?;

    let mut forms = state.forms.write().await;
    evict_idle(&mut forms, state.config.form_ttl, Utc::now());
    if forms.len() >= state.config.max_forms {
        return Err(AppError::TooManyForms(state.config.max_forms));
    }
    let id = state.next_form_id.fetch_add(1, Ordering::SeqCst);
    let view = FormView::new(id, &form);
    forms.insert(id, form);
    drop(forms);

    tracing::info!(">>> 新建表单会话: id={}, origin={}, generator={}", id, origin, view.base_url);
    Ok((StatusCode::CREATED, Json(view)))
}

/// 2. 查看表单当前状态
pub async fn get_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<FormView>, AppError> {
    let view = with_form(&state, id, |form| Ok(FormView::new(id, form))).await?;
    Ok(Json(view))
}

/// 关闭页面，丢弃整个会话
pub async fn delete_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let mut forms = state.forms.write().await;
    evict_idle(&mut forms, state.config.form_ttl, Utc::now());
    forms.remove(&id).ok_or(AppError::FormNotFound(id))?;
    tracing::info!("<<< 表单会话已关闭: id={}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_entity_name(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    payload: Result<Json<EntityNamePayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let payload = json_body(payload)?;
    with_form(&state, id, |form| {
        form.set_entity_name(payload.entity_name);
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 3. 添加一行字段输入
pub async fn add_field(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let view = with_form(&state, id, |form| Ok(FieldRowView::from(form.add_field_row()))).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_field(
    State(state): State<Arc<AppState>>,
    Path((id, row_id)): Path<(u64, u64)>,
    payload: Result<Json<FieldRowInput>, JsonRejection>,
) -> Result<Json<FieldRowView>, AppError> {
    let payload = json_body(payload)?;
    let view = with_form(&state, id, |form| {
        form.update_field_row(row_id, payload).map(FieldRowView::from)
    })
    .await?;
    Ok(Json(view))
}

/// 4. 添加一行关联输入
pub async fn add_relationship(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let row = with_form(&state, id, |form| Ok(form.add_relationship_row().clone())).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn update_relationship(
    State(state): State<Arc<AppState>>,
    Path((id, row_id)): Path<(u64, u64)>,
    payload: Result<Json<RelationshipRowInput>, JsonRejection>,
) -> Result<Json<RelationshipRow>, AppError> {
    let payload = json_body(payload)?;
    let row = with_form(&state, id, |form| {
        form.update_relationship_row(row_id, payload).cloned()
    })
    .await?;
    Ok(Json(row))
}

/// 5. 删除某一行 (字段或关联)
pub async fn remove_row(
    State(state): State<Arc<AppState>>,
    Path((id, row_id)): Path<(u64, u64)>,
) -> Result<StatusCode, AppError> {
    with_form(&state, id, |form| form.remove_row(row_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 预览将要提交的元数据，不发请求
pub async fn preview_metadata(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<EntityMetadata>, AppError> {
    let metadata = with_form(&state, id, |form| Ok(form.assemble()?)).await?;
    Ok(Json(metadata))
}

/// 请生成器只做校验，不生成文件
pub async fn validate_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<ValidationReport>, AppError> {
    let (metadata, base_url) =
        with_form(&state, id, |form| Ok((form.assemble()?, form.base_url().to_string()))).await?;

    let report = state.generator.validate(&base_url, &metadata).await?;
    tracing::info!("<<< 校验结果: {}, valid={}", metadata.entity_name, report.valid);
    Ok(Json(report))
}

/// 6. 提交表单。锁内只做同步的读取和组装，网络请求在释放锁之后进行，
/// 请求期间对行的修改不会影响已经组装好的载荷。
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut notifier = RecordingNotifier::new();

    let (prepared, target, entity_name_error) = with_form(&state, id, |form| {
        let prepared = form.prepare_submission(&mut notifier);
        Ok((prepared, form.target(), form.entity_name_error().clone()))
    })
    .await?;

    let outcome = match prepared {
        Some(metadata) => {
            submit_metadata(state.generator.as_ref(), &target, &metadata, &mut notifier).await
        }
        None => SubmitOutcome::Invalid,
    };

    Ok(Json(SubmitResponse {
        outcome,
        notifications: notifier.into_notifications(),
        entity_name_error,
    }))
}

/// 7. 预览生成器将要输出的代码，不落盘
pub async fn preview_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<HashMap<String, String>>, AppError> {
    let (metadata, base_url) =
        with_form(&state, id, |form| Ok((form.assemble()?, form.base_url().to_string()))).await?;

    let files = state.generator.preview(&base_url, &metadata).await?;
    tracing::info!("<<< 代码预览: {}, {} 个文件", metadata.entity_name, files.len());
    Ok(Json(files))
}

/// 8. 列出生成器上已经生成过的实体
pub async fn list_generated(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<String>>, AppError> {
    let base_url = with_form(&state, id, |form| Ok(form.base_url().to_string())).await?;
    let names = state.generator.list_generated(&base_url).await?;
    Ok(Json(names))
}

/// 删除某个实体已生成的文件
pub async fn delete_generated(
    State(state): State<Arc<AppState>>,
    Path((id, entity_name)): Path<(u64, String)>,
) -> Result<Json<Value>, AppError> {
    let base_url = with_form(&state, id, |form| Ok(form.base_url().to_string())).await?;
    let message = state.generator.delete_generated(&base_url, &entity_name).await?;
    tracing::info!("<<< 已删除生成文件: {}", entity_name);
    Ok(Json(json!({ "message": message })))
}
