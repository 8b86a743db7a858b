use std::marker::PhantomData;
use std::sync::OnceLock;

use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::{ConnectionTrait, EntityName, EntityTrait, IdenStatic, Iterable, QueryFilter};

use crate::ScopeError;
use crate::ast::{JoinClause, JoinKind, QueryAst, TableSource, qualified_column};
use crate::entity_traits::{TableMeta, TenantScopedEntity};
use crate::options::ScopingOptions;
use crate::subquery::SubqueryEngine;

/// A filtered, optionally joined and eager-loading query over one entity,
/// whose bulk `delete_all` / `update_all` are tenant-scoped.
///
/// Building methods consume and return the relation, and each one drops the
/// memoized query AST and any loaded rows.
///
/// # Example
/// ```rust,ignore
/// use tenant_scope::{Assignments, TenantRelationExt};
///
/// let deleted = widget::Entity::tenant_relation()
///     .filter(widget::Column::Name.eq("bolt"))
///     .delete_all(&ctx, &conn)
///     .await?;
///
/// let updated = widget::Entity::tenant_relation()
///     .join::<gadget::Entity>(JoinKind::Inner, widget::Column::Id, gadget::Column::WidgetId)
///     .update_all(Assignments::new().set(widget::Column::Name, "spring"), &ctx, &conn)
///     .await?;
/// ```
pub struct TenantRelation<E: TenantScopedEntity> {
    constraints: Vec<SimpleExpr>,
    joins: Vec<JoinClause>,
    eager_joins: Vec<JoinClause>,
    eager_tables: Vec<String>,
    options: ScopingOptions,
    arel: OnceLock<QueryAst>,
    records: Option<Vec<E::Model>>,
    _entity: PhantomData<E>,
}

impl<E: TenantScopedEntity> Default for TenantRelation<E> {
    fn default() -> Self {
        Self {
            constraints: Vec::new(),
            joins: Vec::new(),
            eager_joins: Vec::new(),
            eager_tables: Vec::new(),
            options: ScopingOptions::default(),
            arel: OnceLock::new(),
            records: None,
            _entity: PhantomData,
        }
    }
}

impl<E: TenantScopedEntity> std::fmt::Debug for TenantRelation<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRelation")
            .field("table", &table_name::<E>())
            .field("constraints", &self.constraints)
            .field("joins", &self.joins)
            .field("eager_joins", &self.eager_joins)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl<E: TenantScopedEntity> TenantRelation<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: ScopingOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &ScopingOptions {
        &self.options
    }

    /// Adds a `WHERE` conjunct.
    #[must_use]
    pub fn filter(mut self, constraint: impl Into<SimpleExpr>) -> Self {
        self.constraints.push(constraint.into());
        self.reset();
        self
    }

    /// Joins `R` on `R.foreign = E.local`.
    #[must_use]
    pub fn join<R: EntityTrait>(mut self, kind: JoinKind, local: E::Column, foreign: R::Column) -> Self {
        self.joins.push(join_clause::<E, R>(kind, local, foreign));
        self.reset();
        self
    }

    /// Eager-loads `R` through a `LEFT JOIN` on `R.foreign = E.local`.
    ///
    /// The joined rows are projected next to the entity's own columns, so one
    /// entity row may appear several times in the raw select.
    #[must_use]
    pub fn eager_load<R: EntityTrait>(mut self, local: E::Column, foreign: R::Column) -> Self {
        self.eager_joins
            .push(join_clause::<E, R>(JoinKind::Left, local, foreign));
        self.eager_tables.push(table_name::<R>());
        self.reset();
        self
    }

    #[must_use]
    pub fn is_eager_loading(&self) -> bool {
        !self.eager_joins.is_empty()
    }

    /// Query AST of the relation, built once and memoized until the next
    /// change or [`reset`](Self::reset).
    #[must_use]
    pub fn arel(&self) -> &QueryAst {
        self.arel.get_or_init(|| {
            if self.is_eager_loading() {
                self.apply_join_dependency()
            } else {
                self.build_arel()
            }
        })
    }

    /// # Errors
    /// Returns `ScopeError::EmptyPrimaryKey` if the entity declares no key columns.
    pub fn table_meta() -> Result<TableMeta, ScopeError> {
        TableMeta::of::<E>()
    }

    /// Rows matched by the relation, without tenant scoping. Loaded once.
    ///
    /// Rows are selected through the primary-key membership predicate, so joins
    /// and eager loads never yield the same row twice.
    ///
    /// # Errors
    /// Returns `ScopeError::Db` if the query fails.
    pub async fn load<C>(&mut self, conn: &C) -> Result<&[E::Model], ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        if self.records.is_none() {
            let meta = Self::table_meta()?;
            let predicate = SubqueryEngine::new(&meta, conn.get_database_backend(), &self.options)
                .unscoped_membership_predicate(self.arel());
            let rows = E::find().filter(predicate).all(conn).await?;
            self.records = Some(rows);
        }
        Ok(self.records.as_deref().unwrap_or_default())
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// Drops the memoized AST and loaded rows. Filters and joins are kept.
    pub fn reset(&mut self) {
        self.arel = OnceLock::new();
        self.records = None;
    }

    fn build_arel(&self) -> QueryAst {
        let table = table_name::<E>();
        let mut ast = QueryAst::new(TableSource::table(table.as_str()));
        for column in E::Column::iter() {
            ast.push_projection(qualified_column(&table, column.as_str()));
        }
        for join in &self.joins {
            ast.push_join(join.clone());
        }
        for constraint in &self.constraints {
            ast.push_constraint(constraint.clone());
        }
        ast
    }

    fn apply_join_dependency(&self) -> QueryAst {
        let mut ast = self.build_arel();
        for join in &self.eager_joins {
            ast.push_join(join.clone());
        }
        for table in &self.eager_tables {
            ast.push_projection(Expr::table_asterisk(Alias::new(table)).into());
        }
        ast
    }
}

/// Starts a [`TenantRelation`] from an entity type.
pub trait TenantRelationExt: TenantScopedEntity {
    #[must_use]
    fn tenant_relation() -> TenantRelation<Self> {
        TenantRelation::new()
    }
}

impl<E: TenantScopedEntity> TenantRelationExt for E {}

pub(crate) fn table_name<T: EntityTrait>() -> String {
    T::default().table_name().to_owned()
}

fn join_clause<E: EntityTrait, R: EntityTrait>(
    kind: JoinKind,
    local: E::Column,
    foreign: R::Column,
) -> JoinClause {
    let local_table = table_name::<E>();
    let foreign_table = table_name::<R>();
    JoinClause {
        kind,
        on: Expr::col((Alias::new(&foreign_table), Alias::new(foreign.as_str())))
            .equals((Alias::new(&local_table), Alias::new(local.as_str()))),
        source: TableSource::table(foreign_table),
    }
}
