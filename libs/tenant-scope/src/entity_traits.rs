use sea_orm::{EntityName, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn};

use crate::ScopeError;

/// Entities whose bulk mutations are tenant-scoped.
///
/// The locking decision is explicit: return `Some(Column::LockVersion)` to have
/// `update_all` bump the optimistic-locking column, or `None`.
///
/// # Example (Manual Implementation)
/// ```rust,ignore
/// impl TenantScopedEntity for widget::Entity {
///     fn locking_column() -> Option<Self::Column> {
///         Some(widget::Column::LockVersion)
///     }
/// }
/// ```
///
/// # Example (Using Derive Macro)
/// ```rust,ignore
/// #[derive(Clone, Debug, PartialEq, DeriveEntityModel, TenantScoped)]
/// #[sea_orm(table_name = "widgets")]
/// #[tenant_scope(locking_col = "lock_version")]
/// pub struct Model {
///     #[sea_orm(primary_key)]
///     pub id: i32,
///     pub account_id: i64,
///     pub lock_version: i32,
/// }
/// ```
pub trait TenantScopedEntity: EntityTrait {
    /// Column holding the optimistic-locking version, if the entity uses one.
    fn locking_column() -> Option<Self::Column>;
}

/// Ordered, non-empty list of primary-key columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryKey {
    columns: Vec<String>,
}

impl PrimaryKey {
    /// # Errors
    /// Returns `ScopeError::EmptyPrimaryKey` when `columns` is empty.
    pub fn new<I, S>(table: &str, columns: I) -> Result<Self, ScopeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ScopeError::EmptyPrimaryKey {
                table: table.to_owned(),
            });
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }
}

/// Table metadata the rewrite needs: name, columns, key and locking column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableMeta {
    table: String,
    columns: Vec<String>,
    primary_key: PrimaryKey,
    locking_column: Option<String>,
}

impl TableMeta {
    /// # Errors
    /// Returns `ScopeError::EmptyPrimaryKey` when `primary_key` is empty.
    pub fn new<C, K>(
        table: impl Into<String>,
        columns: C,
        primary_key: K,
    ) -> Result<Self, ScopeError>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        K: IntoIterator,
        K::Item: Into<String>,
    {
        let table = table.into();
        let primary_key = PrimaryKey::new(&table, primary_key)?;
        Ok(Self {
            columns: columns.into_iter().map(Into::into).collect(),
            table,
            primary_key,
            locking_column: None,
        })
    }

    /// Metadata of a `SeaORM` entity.
    ///
    /// # Errors
    /// Returns `ScopeError::EmptyPrimaryKey` if the entity declares no key columns.
    pub fn of<E: TenantScopedEntity>() -> Result<Self, ScopeError> {
        let meta = Self::new(
            E::default().table_name(),
            E::Column::iter().map(|c| c.as_str().to_owned()),
            E::PrimaryKey::iter().map(|k| k.into_column().as_str().to_owned()),
        )?;
        Ok(meta.with_locking_column(E::locking_column().map(|c| c.as_str().to_owned())))
    }

    #[must_use]
    pub fn with_locking_column(mut self, column: Option<String>) -> Self {
        self.locking_column = column;
        self
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    #[must_use]
    pub fn locking_column(&self) -> Option<&str> {
        self.locking_column.as_deref()
    }
}
