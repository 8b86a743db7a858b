use sea_orm::sea_query::{Alias, ConditionalStatement, DeleteStatement, Query};
use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryTrait};
use tenant_context::TenantContext;
use tracing::debug;

use crate::ScopeError;
use crate::entity_traits::TenantScopedEntity;
use crate::gate::bypass_scoping;
use crate::relation::{TenantRelation, table_name};
use crate::subquery::SubqueryEngine;

impl<E: TenantScopedEntity> TenantRelation<E> {
    /// Bulk `DELETE` for the relation, restricted to the current tenant.
    ///
    /// Without an applicable tenant this is the relation's plain delete.
    ///
    /// # Errors
    /// Returns `ScopeError::EmptyPrimaryKey` if the entity declares no key columns.
    pub fn build_delete_statement(
        &self,
        ctx: &dyn TenantContext,
        backend: DbBackend,
    ) -> Result<DeleteStatement, ScopeError> {
        let meta = Self::table_meta()?;
        let engine = SubqueryEngine::new(&meta, backend, self.options());

        if bypass_scoping(ctx) {
            let mut delete = E::delete_many();
            if self.arel().has_joins() {
                delete = delete.filter(engine.unscoped_membership_predicate(self.arel()));
            } else {
                for constraint in self.arel().constraints() {
                    delete = delete.filter(constraint.clone());
                }
            }
            return Ok(delete.into_query());
        }

        let mut stmt = Query::delete();
        stmt.from_table(Alias::new(meta.table()))
            .and_where(engine.membership_predicate(self.arel(), ctx));
        debug!(table = meta.table(), "Built tenant-scoped delete");
        Ok(stmt)
    }

    /// Deletes every row of the relation that belongs to the current tenant
    /// and returns the number of rows removed.
    ///
    /// The relation's memoized state is reset afterwards.
    ///
    /// # Errors
    /// - `ScopeError::Db` if the statement fails; the error is passed through unchanged.
    /// - `ScopeError::EmptyPrimaryKey` if the entity declares no key columns.
    #[tracing::instrument(
        name = "tenant_scope.delete_all",
        skip_all,
        fields(table = %table_name::<E>(), label = %self.options().statement_label)
    )]
    pub async fn delete_all<C>(
        &mut self,
        ctx: &dyn TenantContext,
        conn: &C,
    ) -> Result<u64, ScopeError>
    where
        C: ConnectionTrait + Send + Sync,
    {
        let backend = conn.get_database_backend();
        let stmt = self.build_delete_statement(ctx, backend)?;
        let rows_affected = conn.execute(backend.build(&stmt)).await?.rows_affected();
        debug!(
            label = %self.options().statement_label,
            rows_affected,
            "Bulk delete executed"
        );
        self.reset();
        Ok(rows_affected)
    }
}
