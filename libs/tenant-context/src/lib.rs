#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant context provider for tenant-scoped bulk mutations.
//!
//! The rewrite layer in `tenant-scope` never reads an ambient "current tenant".
//! Callers build a [`TenantScope`] per request (or implement [`TenantContext`]
//! themselves) and pass it by reference into every bulk operation.
//!
//! ```rust
//! use std::sync::Arc;
//! use tenant_context::{CurrentTenant, PartitionKeys, TenantContext, TenantScope};
//!
//! let keys = Arc::new(PartitionKeys::default().with_key("Account", "account_id"));
//! let scope = TenantScope::for_tenant(CurrentTenant::new("Account", 42_i64), keys);
//!
//! assert_eq!(scope.current_tenant_class(), Some("Account"));
//! assert_eq!(scope.partition_key("Account"), "account_id");
//! assert!(!scope.current_tenant_is_id());
//! ```

pub mod context;
pub mod current;
pub mod error;
pub mod partition;
pub mod tenant_id;

pub use context::{TenantContext, TenantScope};
pub use current::CurrentTenant;
pub use error::ConfigError;
pub use partition::{PartitionKeys, TenancyConfig};
pub use tenant_id::TenantId;
