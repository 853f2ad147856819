use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 字段类型，线上名称与生成器支持的类型列表一致
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Long,
    Double,
    Boolean,
    #[serde(rename = "LocalDate", alias = "Date")]
    Date,
    #[serde(rename = "LocalDateTime", alias = "DateTime")]
    DateTime,
}

impl FieldType {
    /// 下拉框的选项顺序，第一个即新行的默认值
    pub const ALL: [FieldType; 7] = [
        FieldType::String,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Double,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::DateTime,
    ];
}

/// Size 校验的参数，未填写的一侧不出现在 JSON 中
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ValidationRule {
    NotNull,
    Size { parameters: SizeParameters },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwaggerConfig {
    pub description: Option<String>,
}

/// 提交给生成器的字段描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub nullable: bool,
    pub primary_key: bool,
    pub validations: Vec<ValidationRule>,
    pub swagger_config: SwaggerConfig,
}

/// 表单中的一行字段输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRow {
    pub row_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub not_null: bool,
    pub primary_key: bool,
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
    pub description: String,
}

impl FieldRow {
    pub fn new(row_id: u64) -> Self {
        Self {
            row_id,
            name: String::new(),
            field_type: FieldType::default(),
            not_null: false,
            primary_key: false,
            min_size: None,
            max_size: None,
            description: String::new(),
        }
    }

    /// "Not Null" 复选框与其 label 共用的 id
    pub fn not_null_id(&self) -> String {
        format!("notNull_{}", self.row_id)
    }

    pub fn primary_key_id(&self) -> String {
        format!("primaryKey_{}", self.row_id)
    }

    /// 用输入框的原始值覆盖本行，尺寸输入在这里解析
    pub fn apply(&mut self, input: FieldRowInput) -> Result<(), AppError> {
        let min_size = parse_size_input("Min Size", &input.min_size)?;
        let max_size = parse_size_input("Max Size", &input.max_size)?;

        self.name = input.name;
        self.field_type = input.field_type;
        self.not_null = input.not_null;
        self.primary_key = input.primary_key;
        self.min_size = min_size;
        self.max_size = max_size;
        self.description = input.description;
        Ok(())
    }

    /// 提交时读取本行，生成字段描述
    pub fn to_descriptor(&self) -> FieldDescriptor {
        let mut validations = Vec::new();

        if self.not_null {
            validations.push(ValidationRule::NotNull);
        }
        if self.min_size.is_some() || self.max_size.is_some() {
            validations.push(ValidationRule::Size {
                parameters: SizeParameters {
                    min: self.min_size,
                    max: self.max_size,
                },
            });
        }

        let description = if self.description.is_empty() {
            None
        } else {
            Some(self.description.clone())
        };

        FieldDescriptor {
            name: self.name.clone(),
            field_type: self.field_type,
            nullable: !self.not_null,
            primary_key: self.primary_key,
            validations,
            swagger_config: SwaggerConfig { description },
        }
    }
}

/// 前端回传的一行字段输入，数值框保持字符串原样
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRowInput {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub not_null: bool,
    pub primary_key: bool,
    pub min_size: String,
    pub max_size: String,
    pub description: String,
}

/// 空输入表示未填写；非空时必须是非负整数
fn parse_size_input(label: &str, raw: &str) -> Result<Option<u32>, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| AppError::InvalidInput(format!("{label} must be a whole number, got '{raw}'")))
}
