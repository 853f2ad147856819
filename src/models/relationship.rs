use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[default]
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 4] = [
        RelationshipKind::OneToOne,
        RelationshipKind::OneToMany,
        RelationshipKind::ManyToOne,
        RelationshipKind::ManyToMany,
    ];
}

/// 关联数据的加载方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FetchType {
    #[default]
    Lazy,
    Eager,
}

impl FetchType {
    pub const ALL: [FetchType; 2] = [FetchType::Lazy, FetchType::Eager];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDescriptor {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub target_entity: String,
    pub source_field: String,
    pub fetch: FetchType,
}

/// 表单中的一行关联输入，没有复选框，因此不需要额外的 id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRow {
    pub row_id: u64,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub target_entity: String,
    pub source_field: String,
    pub fetch: FetchType,
}

impl RelationshipRow {
    pub fn new(row_id: u64) -> Self {
        Self {
            row_id,
            kind: RelationshipKind::default(),
            target_entity: String::new(),
            source_field: String::new(),
            fetch: FetchType::default(),
        }
    }

    pub fn apply(&mut self, input: RelationshipRowInput) {
        self.kind = input.kind;
        self.target_entity = input.target_entity;
        self.source_field = input.source_field;
        self.fetch = input.fetch;
    }

    /// 原样读取，不校验目标实体是否存在
    pub fn to_descriptor(&self) -> RelationshipDescriptor {
        RelationshipDescriptor {
            kind: self.kind,
            target_entity: self.target_entity.clone(),
            source_field: self.source_field.clone(),
            fetch: self.fetch,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelationshipRowInput {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub target_entity: String,
    pub source_field: String,
    pub fetch: FetchType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_is_copied_verbatim() {
        let mut row = RelationshipRow::new(3);
        row.apply(RelationshipRowInput {
            kind: RelationshipKind::ManyToOne,
            target_entity: "NoSuchEntity".into(),
            source_field: "".into(),
            fetch: FetchType::Eager,
        });

        assert_eq!(
            serde_json::to_value(row.to_descriptor()).unwrap(),
            json!({
                "type": "ManyToOne",
                "targetEntity": "NoSuchEntity",
                "sourceField": "",
                "fetch": "EAGER"
            })
        );
    }

    #[test]
    fn new_row_uses_first_options() {
        let row = RelationshipRow::new(1);
        assert_eq!(row.kind, RelationshipKind::OneToOne);
        assert_eq!(row.fetch, FetchType::Lazy);
    }

    #[test]
    fn input_parses_wire_names() {
        let input: RelationshipRowInput = serde_json::from_value(json!({
            "type": "OneToMany",
            "targetEntity": "Order",
            "sourceField": "orders",
            "fetch": "LAZY"
        }))
        .unwrap();
        assert_eq!(input.kind, RelationshipKind::OneToMany);
        assert_eq!(input.fetch, FetchType::Lazy);
    }
}
