//! SurrealDB 字段的 serde 辅助
//!
//! RecordId 有两种输入形态：数据库原生值是结构化的 Thing，
//! API JSON 里是 "table:id" 字符串。这里的辅助让 db model
//! 字段两种都能接收，序列化时统一输出字符串。

use serde::{Deserialize, Deserializer, Serializer};
use serde::de::Error as DeError;
use surrealdb::RecordId;

/// null/缺省按 true 处理
pub fn bool_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}

/// null/缺省按 false 处理
pub fn bool_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(false))
}

// 字符串形态放在前面，保证 JSON 字符串不会被 Native 分支吃掉
#[derive(Deserialize)]
#[serde(untagged)]
enum AnyRecordId {
    Text(String),
    Native(RecordId),
}

impl AnyRecordId {
    fn into_record_id<E: DeError>(self) -> Result<RecordId, E> {
        match self {
            AnyRecordId::Text(raw) => raw
                .parse::<RecordId>()
                .map_err(|_| E::custom(format!("invalid record id: {}", raw))),
            AnyRecordId::Native(id) => Ok(id),
        }
    }
}

/// RecordId 字段，输出 "table:id" 字符串
pub mod record_id {
    use super::*;

    pub fn serialize<S>(id: &RecordId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D>(d: D) -> Result<RecordId, D::Error>
    where
        D: Deserializer<'de>,
    {
        AnyRecordId::deserialize(d)?.into_record_id()
    }
}

/// Option<RecordId> 字段
pub mod option_record_id {
    use super::*;

    pub fn serialize<S>(id: &Option<RecordId>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(id) => s.serialize_some(&id.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(d: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<AnyRecordId>::deserialize(d)? {
            Some(any) => any.into_record_id().map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use surrealdb::RecordId;

    #[derive(Serialize, Deserialize)]
    struct Row {
        #[serde(with = "super::record_id")]
        id: RecordId,
        #[serde(default, with = "super::option_record_id")]
        owner: Option<RecordId>,
        #[serde(default, deserialize_with = "super::bool_false")]
        is_default: bool,
    }

    #[test]
    fn test_record_id_from_string() {
        let row: Row = serde_json::from_str(r#"{"id": "order:abc123"}"#).unwrap();
        assert_eq!(row.id.to_string(), "order:abc123");
        assert!(row.owner.is_none());
        assert!(!row.is_default);
    }

    #[test]
    fn test_record_id_serializes_as_string() {
        let row: Row =
            serde_json::from_str(r#"{"id": "order:abc123", "owner": "user:u1"}"#).unwrap();
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"id\":\"order:abc123\""));
        assert!(json.contains("\"owner\":\"user:u1\""));
    }

    #[test]
    fn test_null_bool_defaults() {
        let row: Row =
            serde_json::from_str(r#"{"id": "a:1", "is_default": null}"#).unwrap();
        assert!(!row.is_default);
    }

    #[test]
    fn test_garbage_record_id_is_rejected() {
        assert!(serde_json::from_str::<Row>(r#"{"id": 42}"#).is_err());
    }
}
