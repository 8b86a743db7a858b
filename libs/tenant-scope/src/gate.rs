use tenant_context::TenantContext;

/// Decides whether a bulk operation skips tenant scoping.
///
/// Returns `true` (run the unscoped base operation) when:
/// - there is no current tenant id, or
/// - the current tenant is identified by the row's own primary key.
///
/// # Precondition
///
/// In the second case the caller's constraints already pin rows by a key that
/// encodes tenant identity. A partition-column predicate would be redundant at
/// best, so none is ever re-added.
#[must_use]
pub fn bypass_scoping(ctx: &dyn TenantContext) -> bool {
    if ctx.current_tenant_id().is_none() {
        tracing::debug!("No current tenant; tenant scoping bypassed");
        return true;
    }
    if ctx.current_tenant_is_id() {
        tracing::debug!("Current tenant is identified by primary key; tenant scoping bypassed");
        return true;
    }
    false
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tenant_context::{CurrentTenant, TenantScope};

    #[test]
    fn test_no_tenant_bypasses() {
        assert!(bypass_scoping(&TenantScope::default()));
    }

    #[test]
    fn test_tenant_identified_by_id_bypasses() {
        let tenant = CurrentTenant::new("Account", 1_i64).identified_by_primary_key();
        let scope = TenantScope::for_tenant(tenant, Arc::default());
        assert!(bypass_scoping(&scope));
    }

    #[test]
    fn test_regular_tenant_is_scoped() {
        let scope = TenantScope::for_tenant(CurrentTenant::new("Account", 1_i64), Arc::default());
        assert!(!bypass_scoping(&scope));
    }
}
