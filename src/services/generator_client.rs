use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::models::entity::{EntityMetadata, GenerationResponse, ValidationReport};
use crate::services::base_address::{GENERATED_PATH, GENERATE_PATH, PREVIEW_PATH, VALIDATE_PATH};

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("{0}")]
    Decode(String),

    #[error("invalid generator url: {0}")]
    Url(String),
}

/// 远端代码生成服务
#[async_trait]
pub trait GeneratorClient: Send + Sync + 'static {
    async fn generate(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<GenerationResponse, GeneratorError>;

    async fn validate(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<ValidationReport, GeneratorError>;

    /// 生成代码的预览，文件名 -> 内容，不落盘
    async fn preview(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<HashMap<String, String>, GeneratorError>;

    async fn list_generated(&self, base_url: &str) -> Result<Vec<String>, GeneratorError>;

    /// 删除某个实体已生成的文件，返回生成器的说明文字
    async fn delete_generated(&self, base_url: &str, entity_name: &str) -> Result<String, GeneratorError>;
}

/// 基于 reqwest 的实现。不设超时，也不重试。
#[derive(Clone, Default)]
pub struct HttpGeneratorClient {
    http: reqwest::Client,
}

impl HttpGeneratorClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GeneratorError> {
        if !resp.status().is_success() {
            return Err(GeneratorError::Status(resp.status().as_u16()));
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GeneratorError::Decode(e.to_string()))
    }
}

/// 实体名作为单独的路径段拼接，保证被正确转义
fn generated_entity_url(base_url: &str, entity_name: &str) -> Result<Url, GeneratorError> {
    let mut url = Url::parse(&format!("{base_url}{GENERATED_PATH}"))
        .map_err(|e| GeneratorError::Url(format!("{base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| GeneratorError::Url(base_url.to_string()))?
        .push(entity_name);
    Ok(url)
}

#[async_trait]
impl GeneratorClient for HttpGeneratorClient {
    async fn generate(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<GenerationResponse, GeneratorError> {
        let url = format!("{base_url}{GENERATE_PATH}");
        tracing::info!(">>> 请求生成实体: {} -> {}", metadata.entity_name, url);
        // .json() 会带上 Content-Type: application/json
        let resp = self.http.post(&url).json(metadata).send().await?;
        Self::read_json(resp).await
    }

    async fn validate(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<ValidationReport, GeneratorError> {
        let url = format!("{base_url}{VALIDATE_PATH}");
        tracing::info!(">>> 请求校验实体: {} -> {}", metadata.entity_name, url);
        let resp = self.http.post(&url).json(metadata).send().await?;
        Self::read_json(resp).await
    }

    async fn preview(
        &self,
        base_url: &str,
        metadata: &EntityMetadata,
    ) -> Result<HashMap<String, String>, GeneratorError> {
        let url = format!("{base_url}{PREVIEW_PATH}");
        tracing::info!(">>> 请求预览代码: {} -> {}", metadata.entity_name, url);
        // 生成器的预览接口是带请求体的 GET
        let resp = self.http.get(&url).json(metadata).send().await?;
        Self::read_json(resp).await
    }

    async fn list_generated(&self, base_url: &str) -> Result<Vec<String>, GeneratorError> {
        let resp = self.http.get(format!("{base_url}{GENERATED_PATH}")).send().await?;
        Self::read_json(resp).await
    }

    async fn delete_generated(&self, base_url: &str, entity_name: &str) -> Result<String, GeneratorError> {
        let url = generated_entity_url(base_url, entity_name)?;
        tracing::info!(">>> 请求删除已生成文件: {} -> {}", entity_name, url);
        let resp = self.http.delete(url).send().await?;

        if !resp.status().is_success() {
            return Err(GeneratorError::Status(resp.status().as_u16()));
        }
        Ok(resp.text().await?)
    }
}

/// 测试用的脚本化生成器，记录调用次数和最后一次收到的载荷
#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Generated(GenerationResponse),
        Validated(ValidationReport),
        Previewed(HashMap<String, String>),
        Listed(Vec<String>),
        Deleted(String),
        Status(u16),
        Decode(String),
    }

    pub struct ScriptedGenerator {
        reply: Reply,
        calls: AtomicUsize,
        last: Mutex<Option<(String, EntityMetadata)>>,
        deleted: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                deleted: Mutex::new(Vec::new()),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(Reply::Generated(GenerationResponse {
                success: true,
                ..Default::default()
            }))
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<(String, EntityMetadata)> {
            self.last.lock().unwrap().clone()
        }

        pub fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }

        fn record(&self, base_url: &str, metadata: Option<&EntityMetadata>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(metadata) = metadata {
                *self.last.lock().unwrap() = Some((base_url.to_string(), metadata.clone()));
            }
        }

        fn answer<T>(&self, pick: impl FnOnce(&Reply) -> Option<T>) -> Result<T, GeneratorError> {
            match &self.reply {
                Reply::Status(code) => Err(GeneratorError::Status(*code)),
                Reply::Decode(msg) => Err(GeneratorError::Decode(msg.clone())),
                other => pick(other).ok_or_else(|| GeneratorError::Decode(format!("unexpected reply {other:?}"))),
            }
        }
    }

    #[async_trait]
    impl GeneratorClient for ScriptedGenerator {
        async fn generate(
            &self,
            base_url: &str,
            metadata: &EntityMetadata,
        ) -> Result<GenerationResponse, GeneratorError> {
            self.record(base_url, Some(metadata));
            self.answer(|r| match r {
                Reply::Generated(resp) => Some(resp.clone()),
                _ => None,
            })
        }

        async fn validate(
            &self,
            base_url: &str,
            metadata: &EntityMetadata,
        ) -> Result<ValidationReport, GeneratorError> {
            self.record(base_url, Some(metadata));
            self.answer(|r| match r {
                Reply::Validated(report) => Some(report.clone()),
                _ => None,
            })
        }

        async fn preview(
            &self,
            base_url: &str,
            metadata: &EntityMetadata,
        ) -> Result<HashMap<String, String>, GeneratorError> {
            self.record(base_url, Some(metadata));
            self.answer(|r| match r {
                Reply::Previewed(files) => Some(files.clone()),
                _ => None,
            })
        }

        async fn list_generated(&self, base_url: &str) -> Result<Vec<String>, GeneratorError> {
            self.record(base_url, None);
            self.answer(|r| match r {
                Reply::Listed(names) => Some(names.clone()),
                _ => None,
            })
        }

        async fn delete_generated(&self, base_url: &str, entity_name: &str) -> Result<String, GeneratorError> {
            self.record(base_url, None);
            let answer = self.answer(|r| match r {
                Reply::Deleted(message) => Some(message.clone()),
                _ => None,
            });
            if answer.is_ok() {
                self.deleted.lock().unwrap().push(entity_name.to_string());
            }
            answer
        }
    }
}
