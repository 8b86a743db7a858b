use std::sync::Arc;

use crate::{CurrentTenant, PartitionKeys, TenantId};

/// Provides the active tenant to tenant-scoped bulk operations.
///
/// Implementations are request-scoped and read-only for the duration of an
/// operation. Bulk operations receive the context explicitly; nothing in the
/// rewrite layer reads a process-wide "current tenant".
pub trait TenantContext: Send + Sync {
    /// The active tenant, if any.
    fn current_tenant(&self) -> Option<&CurrentTenant>;

    /// Whether the active tenant's identity coincides with the row's primary key.
    ///
    /// When this holds, the primary key already encodes tenant identity in the
    /// caller's constraints and no partition-column predicate applies.
    fn current_tenant_is_id(&self) -> bool {
        self.current_tenant().is_some_and(CurrentTenant::is_id)
    }

    /// Name of the active tenant's entity type.
    fn current_tenant_class(&self) -> Option<&str> {
        self.current_tenant().map(CurrentTenant::class)
    }

    /// Partition-key column for a tenant class.
    fn partition_key(&self, tenant_class: &str) -> String;

    /// Identifier of the active tenant.
    fn current_tenant_id(&self) -> Option<&TenantId> {
        self.current_tenant().map(CurrentTenant::id)
    }
}

/// Request-scoped tenant context.
///
/// An empty scope (no current tenant) makes bulk operations behave exactly as
/// their unscoped counterparts.
#[derive(Clone, Debug, Default)]
pub struct TenantScope {
    tenant: Option<CurrentTenant>,
    keys: Arc<PartitionKeys>,
}

impl TenantScope {
    /// A scope without an active tenant.
    #[must_use]
    pub fn none(keys: Arc<PartitionKeys>) -> Self {
        Self { tenant: None, keys }
    }

    #[must_use]
    pub fn for_tenant(tenant: CurrentTenant, keys: Arc<PartitionKeys>) -> Self {
        Self {
            tenant: Some(tenant),
            keys,
        }
    }

    #[must_use]
    pub fn has_tenant(&self) -> bool {
        self.tenant.is_some()
    }

    #[must_use]
    pub fn partition_keys(&self) -> &PartitionKeys {
        &self.keys
    }
}

impl TenantContext for TenantScope {
    fn current_tenant(&self) -> Option<&CurrentTenant> {
        self.tenant.as_ref()
    }

    fn partition_key(&self, tenant_class: &str) -> String {
        self.keys.partition_key(tenant_class)
    }
}
