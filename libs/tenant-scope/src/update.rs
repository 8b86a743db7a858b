use sea_orm::sea_query::{Alias, ConditionalStatement, Query, UpdateStatement};
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryTrait};
use tenant_context::TenantContext;
use tracing::debug;

use crate::ScopeError;
use crate::assignment::Updates;
use crate::entity_traits::TenantScopedEntity;
use crate::gate::bypass_scoping;
use crate::relation::{TenantRelation, table_name};
use crate::subquery::SubqueryEngine;

impl<E: TenantScopedEntity> TenantRelation<E> {
    /// Bulk `UPDATE` for the relation, restricted to the current tenant.
    ///
    /// When the entity declares a locking column and a mapping does not set
    /// it, `lock = COALESCE(lock, 0) + 1` is appended, with or without a
    /// current tenant. Raw `SET` fragments are never augmented.
    ///
    /// # Errors
    /// - `ScopeError::EmptyUpdate` if there is nothing to change.
    /// - `ScopeError::UnknownColumn` if an assignment targets a missing column.
    /// - `ScopeError::InvalidAssignment` for a malformed raw fragment.
    /// - `ScopeError::EmptyPrimaryKey` if the entity declares no key columns.
    pub fn build_update_statement(
        &self,
        updates: impl Into<Updates>,
        ctx: &dyn TenantContext,
        backend: DbBackend,
    ) -> Result<UpdateStatement, ScopeError> {
        let mut updates = updates.into();
        updates.ensure_not_empty()?;
        let meta = Self::table_meta()?;
        let engine = SubqueryEngine::new(&meta, backend, self.options());

        if let (Updates::Assign(assignments), Some(lock)) = (&mut updates, meta.locking_column())
            && !assignments.contains(lock)
        {
            debug!(table = meta.table(), column = lock, "Incrementing locking column");
            assignments.push_locking_increment(lock);
        }

        if bypass_scoping(ctx) {
            let mut update = E::update_many();
            for (column, value) in updates.lower(&meta, backend)? {
                update = update.col_expr(Alias::new(column), value);
            }
            if self.arel().has_joins() {
                update = update.filter(engine.unscoped_membership_predicate(self.arel()));
            } else {
                for constraint in self.arel().constraints() {
                    update = update.filter(constraint.clone());
                }
            }
            return Ok(update.into_query());
        }

        let mut stmt = Query::update();
        stmt.table(Alias::new(meta.table()));
        for (column, value) in updates.lower(&meta, backend)? {
            stmt.value(Alias::new(column), value);
        }
        stmt.and_where(engine.membership_predicate(self.arel(), ctx));
        debug!(table = meta.table(), "Built tenant-scoped update");
        Ok(stmt)
    }

    /// Updates every row of the relation that belongs to the current tenant
    /// and returns the number of rows changed.
    ///
    /// The relation's memoized state is reset afterwards.
    ///
    /// # Errors
    /// - `ScopeError::Db` if the statement fails; the error is passed through unchanged.
    /// - Any error of [`build_update_statement`](Self::build_update_statement).
    #[tracing::instrument(
        name = "tenant_scope.update_all",
        skip_all,
        fields(table = %table_name::<E>(), label = %self.options().statement_label)
    )]
    pub async fn update_all<C>(
        &mut self,
        updates: impl Into<Updates>,
        ctx: &dyn TenantContext,
        conn: &C,
    ) -> Result<u64, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        let backend = conn.get_database_backend();
        let stmt = self.build_update_statement(updates, ctx, backend)?;
        let rows_affected = conn.execute(backend.build(&stmt)).await?.rows_affected();
        debug!(
            label = %self.options().statement_label,
            rows_affected,
            "Bulk update executed"
        );
        self.reset();
        Ok(rows_affected)
    }
}
