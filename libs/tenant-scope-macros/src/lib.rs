// Proc-macro crate for tenant-scope derives
//
//! # tenant-scope-macros
//!
//! ## `#[derive(TenantScoped)]`
//!
//! Implements `TenantScopedEntity` for a `SeaORM` entity.
//!
//! The optimistic-locking decision must be explicit: either name the locking
//! column or opt out.
//!
//! ```ignore
//! use sea_orm::entity::prelude::*;
//! use tenant_scope::TenantScoped;
//!
//! #[derive(Clone, Debug, PartialEq, DeriveEntityModel, TenantScoped)]
//! #[sea_orm(table_name = "widgets")]
//! #[tenant_scope(locking_col = "lock_version")]
//! pub struct Model {
//!     #[sea_orm(primary_key)]
//!     pub id: i32,
//!     pub account_id: i64,
//!     pub lock_version: i32,
//! }
//! ```
//!
//! ### Attributes
//!
//! - `locking_col = "column_name"`: optimistic-locking version column
//! - `no_locking`: entity has no locking column

use proc_macro::TokenStream;
use proc_macro_error2::proc_macro_error;
use syn::{DeriveInput, parse_macro_input};

mod tenant_scoped;

/// Derive macro for implementing `TenantScopedEntity`.
///
/// Place this on your `SeaORM` Model struct along with a
/// `#[tenant_scope(...)]` attribute carrying exactly one of
/// `locking_col = "..."` or `no_locking`.
#[proc_macro_derive(TenantScoped, attributes(tenant_scope))]
#[proc_macro_error]
pub fn derive_tenant_scoped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    tenant_scoped::expand_derive_tenant_scoped(input).into()
}
