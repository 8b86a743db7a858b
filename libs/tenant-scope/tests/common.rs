#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Set};
use tenant_scope::{CurrentTenant, PartitionKeys, TenantScope};

pub mod widget {
    use sea_orm::entity::prelude::*;
    use tenant_scope::TenantScoped;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantScoped)]
    #[sea_orm(table_name = "widgets")]
    #[tenant_scope(locking_col = "lock_version")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub account_id: i64,
        pub name: String,
        pub lock_version: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod part {
    use sea_orm::entity::prelude::*;
    use tenant_scope::TenantScoped;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantScoped)]
    #[sea_orm(table_name = "parts")]
    #[tenant_scope(no_locking)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub widget_id: i32,
        pub kind: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod membership {
    use sea_orm::entity::prelude::*;
    use tenant_scope::TenantScoped;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantScoped)]
    #[sea_orm(table_name = "memberships")]
    #[tenant_scope(no_locking)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub org_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: i32,
        pub account_id: i64,
        pub role: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod audit_event {
    use sea_orm::entity::prelude::*;
    use tenant_scope::TenantScoped;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, TenantScoped)]
    #[sea_orm(table_name = "audit_events")]
    #[tenant_scope(no_locking)]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i32,
        pub payload: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

/// Context for tenant `Account#id`.
#[must_use]
pub fn account(id: i64) -> TenantScope {
    TenantScope::for_tenant(
        CurrentTenant::new("Account", id),
        Arc::new(PartitionKeys::default()),
    )
}

/// In-memory `SQLite` with the test schema.
///
/// # Errors
/// Returns an error if the connection or schema creation fails.
pub async fn setup_db() -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(opts).await?;

    for ddl in [
        "CREATE TABLE widgets (
            id INTEGER PRIMARY KEY NOT NULL,
            account_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            lock_version INTEGER NOT NULL DEFAULT 0
        )",
        "CREATE TABLE parts (
            id INTEGER PRIMARY KEY NOT NULL,
            widget_id INTEGER NOT NULL,
            kind TEXT NOT NULL
        )",
        "CREATE TABLE memberships (
            org_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            role TEXT NOT NULL,
            PRIMARY KEY (org_id, user_id)
        )",
        "CREATE TABLE audit_events (
            id INTEGER PRIMARY KEY NOT NULL,
            payload TEXT NOT NULL
        )",
    ] {
        conn.execute_unprepared(ddl).await?;
    }
    Ok(conn)
}

/// # Errors
/// Returns an error if an insert fails.
pub async fn seed_widgets(conn: &DatabaseConnection, rows: &[(i32, i64, &str)]) -> Result<()> {
    for (id, account_id, name) in rows {
        widget::Entity::insert(widget::ActiveModel {
            id: Set(*id),
            account_id: Set(*account_id),
            name: Set((*name).to_owned()),
            lock_version: Set(0),
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}

/// # Errors
/// Returns an error if an insert fails.
pub async fn seed_parts(conn: &DatabaseConnection, rows: &[(i32, i32, &str)]) -> Result<()> {
    for (id, widget_id, kind) in rows {
        part::Entity::insert(part::ActiveModel {
            id: Set(*id),
            widget_id: Set(*widget_id),
            kind: Set((*kind).to_owned()),
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}

/// # Errors
/// Returns an error if an insert fails.
pub async fn seed_memberships(
    conn: &DatabaseConnection,
    rows: &[(i32, i32, i64, &str)],
) -> Result<()> {
    for (org_id, user_id, account_id, role) in rows {
        membership::Entity::insert(membership::ActiveModel {
            org_id: Set(*org_id),
            user_id: Set(*user_id),
            account_id: Set(*account_id),
            role: Set((*role).to_owned()),
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}

/// Widget ids left in the table, ascending.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn widget_ids(conn: &DatabaseConnection) -> Result<Vec<i32>> {
    let mut ids: Vec<i32> = widget::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|w| w.id)
        .collect();
    ids.sort_unstable();
    Ok(ids)
}
