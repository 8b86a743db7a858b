use std::fmt;

use uuid::Uuid;

/// Identifier of a tenant as stored in a partition-key column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum TenantId {
    Uuid(Uuid),
    Int(i64),
    Text(String),
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TenantId::Uuid(id) => write!(f, "{id}"),
            TenantId::Int(id) => write!(f, "{id}"),
            TenantId::Text(id) => f.write_str(id),
        }
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        TenantId::Uuid(id)
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        TenantId::Int(id)
    }
}

impl From<i32> for TenantId {
    fn from(id: i32) -> Self {
        TenantId::Int(i64::from(id))
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        TenantId::Text(id)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        TenantId::Text(id.to_owned())
    }
}
