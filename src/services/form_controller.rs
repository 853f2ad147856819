use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::entity::EntityMetadata;
use crate::models::field::{FieldRow, FieldRowInput};
use crate::models::notification::ErrorElement;
use crate::models::relationship::{RelationshipRow, RelationshipRowInput};
use crate::services::base_address::{derive_base_address, docs_link, PortRewrite};
use crate::services::generator_client::GeneratorClient;
use crate::services::notifier::Notifier;

pub const SUCCESS_MESSAGE: &str = "Entity generated successfully!";

/// 提交前在本地即可发现的问题，不会发出网络请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormIssue {
    #[error("Entity name is required")]
    MissingEntityName,

    #[error("At least one field is required")]
    NoFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// 本地校验未通过
    Invalid,
    Generated,
    Failed,
}

/// 提交所需的地址，在释放会话锁之前复制出来
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTarget {
    pub base_url: String,
    pub docs_link: String,
}

/// 一个页面生命周期内的表单状态。行列表是唯一的数据来源。
#[derive(Debug, Clone)]
pub struct FormController {
    base_url: String,
    docs_link: String,
    entity_name: String,
    entity_name_error: ErrorElement,
    field_rows: Vec<FieldRow>,
    relationship_rows: Vec<RelationshipRow>,
    // 行 id 单调递增，同一时刻添加的两行也不会冲突
    next_row_id: u64,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl FormController {
    pub fn new(origin: &str, rewrite: PortRewrite) -> Result<Self, AppError> {
        let base_url = derive_base_address(origin, rewrite)?;
        let docs_link = docs_link(&base_url);
        let now = Utc::now();
        Ok(Self {
            base_url,
            docs_link,
            entity_name: String::new(),
            entity_name_error: ErrorElement::default(),
            field_rows: Vec::new(),
            relationship_rows: Vec::new(),
            next_row_id: 1,
            created_at: now,
            last_active: now,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn docs_link(&self) -> &str {
        &self.docs_link
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn entity_name_error(&self) -> &ErrorElement {
        &self.entity_name_error
    }

    pub fn field_rows(&self) -> &[FieldRow] {
        &self.field_rows
    }

    pub fn relationship_rows(&self) -> &[RelationshipRow] {
        &self.relationship_rows
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }

    /// 闲置时长达到 ttl 即视为过期；时钟回拨时不算闲置
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_active)
            .to_std()
            .map(|idle| idle >= ttl)
            .unwrap_or(false)
    }

    pub fn target(&self) -> SubmitTarget {
        SubmitTarget {
            base_url: self.base_url.clone(),
            docs_link: self.docs_link.clone(),
        }
    }

    fn allocate_row_id(&mut self) -> u64 {
        let id = self.next_row_id;
        self.next_row_id += 1;
        id
    }

    pub fn set_entity_name(&mut self, name: impl Into<String>) {
        self.entity_name = name.into();
    }

    pub fn add_field_row(&mut self) -> &FieldRow {
        let row_id = self.allocate_row_id();
        self.field_rows.push(FieldRow::new(row_id));
        &self.field_rows[self.field_rows.len() - 1]
    }

    pub fn add_relationship_row(&mut self) -> &RelationshipRow {
        let row_id = self.allocate_row_id();
        self.relationship_rows.push(RelationshipRow::new(row_id));
        &self.relationship_rows[self.relationship_rows.len() - 1]
    }

    pub fn update_field_row(&mut self, row_id: u64, input: FieldRowInput) -> Result<&FieldRow, AppError> {
        let row = self
            .field_rows
            .iter_mut()
            .find(|r| r.row_id == row_id)
            .ok_or(AppError::RowNotFound(row_id))?;
        row.apply(input)?;
        Ok(row)
    }

    pub fn update_relationship_row(
        &mut self,
        row_id: u64,
        input: RelationshipRowInput,
    ) -> Result<&RelationshipRow, AppError> {
        let row = self
            .relationship_rows
            .iter_mut()
            .find(|r| r.row_id == row_id)
            .ok_or(AppError::RowNotFound(row_id))?;
        row.apply(input);
        Ok(row)
    }

    /// 只移除指定的那一行（字段行或关联行），其余行不受影响
    pub fn remove_row(&mut self, row_id: u64) -> Result<(), AppError> {
        if let Some(pos) = self.field_rows.iter().position(|r| r.row_id == row_id) {
            self.field_rows.remove(pos);
            return Ok(());
        }
        if let Some(pos) = self.relationship_rows.iter().position(|r| r.row_id == row_id) {
            self.relationship_rows.remove(pos);
            return Ok(());
        }
        Err(AppError::RowNotFound(row_id))
    }

    pub fn show_entity_name_error(&mut self, message: &str) {
        self.entity_name_error.show(message);
    }

    pub fn hide_entity_name_error(&mut self) {
        self.entity_name_error.hide();
    }

    /// 读取当前所有行并组装元数据，不修改任何状态
    pub fn assemble(&self) -> Result<EntityMetadata, FormIssue> {
        let entity_name = self.entity_name.trim();
        if entity_name.is_empty() {
            return Err(FormIssue::MissingEntityName);
        }

        let fields: Vec<_> = self.field_rows.iter().map(FieldRow::to_descriptor).collect();
        let relationships: Vec<_> = self
            .relationship_rows
            .iter()
            .map(RelationshipRow::to_descriptor)
            .collect();

        if fields.is_empty() {
            return Err(FormIssue::NoFields);
        }

        Ok(EntityMetadata {
            entity_name: entity_name.to_string(),
            fields,
            relationships,
        })
    }

    /// 提交的同步部分：校验、更新行内错误、组装载荷。
    /// 返回 None 时已经向用户给出提示，不应再发请求。
    pub fn prepare_submission<N: Notifier + ?Sized>(&mut self, notifier: &mut N) -> Option<EntityMetadata> {
        match self.assemble() {
            Err(issue @ FormIssue::MissingEntityName) => {
                self.show_entity_name_error(&issue.to_string());
                None
            }
            Err(issue @ FormIssue::NoFields) => {
                self.hide_entity_name_error();
                notifier.alert(&issue.to_string());
                None
            }
            Ok(metadata) => {
                self.hide_entity_name_error();
                Some(metadata)
            }
        }
    }

    /// 完整的提交流程，适用于控制器不被共享的场景
    pub async fn handle_submit<G, N>(&mut self, client: &G, notifier: &mut N) -> SubmitOutcome
    where
        G: GeneratorClient + ?Sized,
        N: Notifier + ?Sized,
    {
        let Some(metadata) = self.prepare_submission(notifier) else {
            return SubmitOutcome::Invalid;
        };
        let target = self.target();
        submit_metadata(client, &target, &metadata, notifier).await
    }
}

/// 回收闲置过期的会话，返回回收数量
pub fn evict_idle(forms: &mut HashMap<u64, FormController>, ttl: Duration, now: DateTime<Utc>) -> usize {
    let before = forms.len();
    forms.retain(|id, form| {
        let keep = !form.is_idle(now, ttl);
        if !keep {
            tracing::info!("--- 回收闲置表单会话: {}, 最后活动: {}", id, form.last_active);
        }
        keep
    });
    before - forms.len()
}

/// 提交的异步部分：发送请求并把结果转成恰好一条弹窗提示，成功时再跳转到文档页
pub async fn submit_metadata<G, N>(
    client: &G,
    target: &SubmitTarget,
    metadata: &EntityMetadata,
    notifier: &mut N,
) -> SubmitOutcome
where
    G: GeneratorClient + ?Sized,
    N: Notifier + ?Sized,
{
    match client.generate(&target.base_url, metadata).await {
        Ok(resp) if resp.success => {
            tracing::info!(
                "<<< 实体生成成功: {}, 文件: {:?}",
                metadata.entity_name,
                resp.generated_files
            );
            notifier.alert(SUCCESS_MESSAGE);
            notifier.navigate(&target.docs_link);
            SubmitOutcome::Generated
        }
        Ok(resp) => {
            let message = resp.message.as_deref().unwrap_or("unknown error");
            tracing::warn!("--- 生成器拒绝: {}, {}", metadata.entity_name, message);
            notifier.alert(&format!("Error: {message}"));
            SubmitOutcome::Failed
        }
        Err(e) => {
            tracing::error!("!!! 生成请求失败: {}, {}", metadata.entity_name, e);
            notifier.alert(&format!("Error generating entity: {e}"));
            SubmitOutcome::Failed
        }
    }
}
