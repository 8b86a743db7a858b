#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant-scoped bulk mutations for `SeaORM`.
//!
//! A [`TenantRelation`] collects filters, joins and eager loads for one entity.
//! Its `delete_all` / `update_all` rewrite the relation into
//!
//! ```sql
//! DELETE FROM widgets
//! WHERE widgets.id IN (SELECT widgets.id FROM widgets ... AND widgets.account_id = $1)
//! ```
//!
//! so the mutation only ever touches rows of the current tenant, whatever joins
//! the relation carries. Composite keys use row values
//! (`(t.a, t.b) IN (SELECT t.a, t.b ...)`), an equivalent tenant predicate is
//! never added twice, and entities with an optimistic-locking column get it
//! incremented on every mapped update.
//!
//! Scoping is skipped when the [`TenantContext`] has no current tenant, or
//! when the tenant is identified by the row's own primary key.
//!
//! # Example
//! ```rust,ignore
//! use sea_orm::entity::prelude::*;
//! use tenant_scope::{Assignments, TenantRelationExt, TenantScoped};
//!
//! #[derive(Clone, Debug, PartialEq, DeriveEntityModel, TenantScoped)]
//! #[sea_orm(table_name = "widgets")]
//! #[tenant_scope(locking_col = "lock_version")]
//! pub struct Model {
//!     #[sea_orm(primary_key)]
//!     pub id: i32,
//!     pub account_id: i64,
//!     pub name: String,
//!     pub lock_version: i32,
//! }
//!
//! let renamed = Entity::tenant_relation()
//!     .filter(Column::Name.eq("bolt"))
//!     .update_all(Assignments::new().set(Column::Name, "nut"), &ctx, &conn)
//!     .await?;
//! ```

pub mod assignment;
pub mod ast;
mod delete;
pub mod entity_traits;
pub mod error;
pub mod gate;
pub mod options;
pub mod relation;
pub mod subquery;
mod update;

pub use assignment::{Assignments, RawAssignment, Updates};
pub use ast::{JoinClause, JoinKind, QueryAst, TableSource};
pub use entity_traits::{PrimaryKey, TableMeta, TenantScopedEntity};
pub use error::ScopeError;
pub use gate::bypass_scoping;
pub use options::{SCOPING_CONFIG_KEY, ScopingOptions};
pub use relation::{TenantRelation, TenantRelationExt};
pub use subquery::SubqueryEngine;

pub use tenant_context::{CurrentTenant, PartitionKeys, TenantContext, TenantId, TenantScope};

#[cfg(feature = "macros")]
pub use tenant_scope_macros::TenantScoped;
