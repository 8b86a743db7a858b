use crate::TenantId;

/// The tenant a request operates on.
///
/// `class` names the tenant entity type (for example `"Account"`) and is used
/// to look up the partition-key column. When the tenant was set by its own
/// primary key rather than through a separate partition column,
/// [`CurrentTenant::identified_by_primary_key`] marks it so bulk operations
/// skip column-level scoping.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CurrentTenant {
    class: String,
    id: TenantId,
    #[serde(default)]
    is_id: bool,
}

impl CurrentTenant {
    #[must_use]
    pub fn new(class: impl Into<String>, id: impl Into<TenantId>) -> Self {
        Self {
            class: class.into(),
            id: id.into(),
            is_id: false,
        }
    }

    /// Marks the tenant as identified by the same column as the row's primary key.
    #[must_use]
    pub fn identified_by_primary_key(mut self) -> Self {
        self.is_id = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &TenantId {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn is_id(&self) -> bool {
        self.is_id
    }
}
