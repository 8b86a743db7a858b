//! Membership-predicate construction.
//!
//! A bulk `DELETE`/`UPDATE` cannot carry joins, so the relation's query is
//! turned into a subquery that projects the primary key and the statement's
//! `WHERE` becomes `pk IN (subquery)`. When a tenant is active the subquery is
//! first restricted by the tenant's partition-key column.

use sea_orm::DbBackend;
use sea_orm::sea_query::{Alias, Expr, Query, SelectStatement, SimpleExpr, Value};
use tenant_context::{TenantContext, TenantId};
use tracing::debug;

use crate::ast::{QueryAst, qualified_column};
use crate::entity_traits::TableMeta;
use crate::options::ScopingOptions;

/// Builds tenant-scoped membership predicates for one table.
///
/// The engine is pure: it clones the AST it is given and never executes a
/// query.
#[derive(Clone, Copy, Debug)]
pub struct SubqueryEngine<'a> {
    meta: &'a TableMeta,
    backend: DbBackend,
    options: &'a ScopingOptions,
}

impl<'a> SubqueryEngine<'a> {
    #[must_use]
    pub fn new(meta: &'a TableMeta, backend: DbBackend, options: &'a ScopingOptions) -> Self {
        Self {
            meta,
            backend,
            options,
        }
    }

    /// Clone of `ast` rebound to the target table and restricted to the
    /// current tenant.
    ///
    /// The tenant predicate is added only when a tenant id is present, the
    /// table has the partition-key column, and no equivalent constraint is
    /// already in place.
    #[must_use]
    pub fn scope(&self, ast: &QueryAst, ctx: &dyn TenantContext) -> QueryAst {
        let mut scoped = self.rebound(ast);
        let Some(predicate) = self.tenant_predicate(ctx) else {
            return scoped;
        };
        if scoped.contains_constraint(&predicate) {
            debug!(
                table = self.meta.table(),
                "Tenant predicate already present; not added again"
            );
        } else {
            scoped.push_constraint(predicate);
        }
        scoped
    }

    /// Subquery selecting the primary-key columns of `scoped`, in declared order.
    #[must_use]
    pub fn membership_subquery(&self, scoped: &QueryAst) -> SelectStatement {
        let mut subquery = scoped.clone();
        subquery.clear_projections();
        for column in self.meta.primary_key().columns() {
            subquery.push_projection(qualified_column(self.meta.table(), column));
        }
        subquery.to_select()
    }

    /// `pk IN (subquery)` over the tenant-scoped version of `ast`.
    #[must_use]
    pub fn membership_predicate(&self, ast: &QueryAst, ctx: &dyn TenantContext) -> SimpleExpr {
        let scoped = self.scope(ast, ctx);
        self.predicate_for(&scoped)
    }

    /// `pk IN (subquery)` over `ast` without any tenant restriction.
    #[must_use]
    pub fn unscoped_membership_predicate(&self, ast: &QueryAst) -> SimpleExpr {
        let rebound = self.rebound(ast);
        self.predicate_for(&rebound)
    }

    fn rebound(&self, ast: &QueryAst) -> QueryAst {
        let mut rebound = ast.clone();
        rebound.rebind_source(self.meta.table());
        rebound
    }

    fn tenant_predicate(&self, ctx: &dyn TenantContext) -> Option<SimpleExpr> {
        let tenant_id = ctx.current_tenant_id()?;
        let class = ctx.current_tenant_class()?;
        let partition_key = ctx.partition_key(class);
        if !self.meta.has_column(&partition_key) {
            debug!(
                table = self.meta.table(),
                column = %partition_key,
                "Partition key column missing; tenant predicate omitted"
            );
            return None;
        }
        Some(
            Expr::col((Alias::new(self.meta.table()), Alias::new(&partition_key)))
                .eq(tenant_value(tenant_id)),
        )
    }

    fn predicate_for(&self, scoped: &QueryAst) -> SimpleExpr {
        let table = self.meta.table();
        let columns = self.meta.primary_key().columns();
        let subquery = self.dialect_safe(self.membership_subquery(scoped));

        if let [column] = columns {
            Expr::col((Alias::new(table), Alias::new(column))).in_subquery(subquery)
        } else {
            Expr::tuple(columns.iter().map(|c| qualified_column(table, c))).in_subquery(subquery)
        }
    }

    /// `MySQL` refuses a subquery reading the table being mutated unless it is
    /// materialized through a derived table.
    fn dialect_safe(&self, subquery: SelectStatement) -> SelectStatement {
        if self.backend != DbBackend::MySql || !self.options.mysql_derived_table {
            return subquery;
        }
        let alias = self.options.subquery_alias.as_str();
        let mut wrapped = Query::select();
        for column in self.meta.primary_key().columns() {
            wrapped.column((Alias::new(alias), Alias::new(column)));
        }
        wrapped.from_subquery(subquery, Alias::new(alias));
        wrapped
    }
}

fn tenant_value(id: &TenantId) -> Value {
    match id {
        TenantId::Uuid(uuid) => Value::from(*uuid),
        TenantId::Int(int) => Value::from(*int),
        TenantId::Text(text) => Value::from(text.clone()),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use sea_orm::sea_query::{
        ConditionalStatement, MysqlQueryBuilder, PostgresQueryBuilder, QueryStatementWriter,
    };
    use tenant_context::{CurrentTenant, PartitionKeys, TenantScope};
    use tracing_test::traced_test;

    use super::*;
    use crate::ast::TableSource;

    fn widgets_meta() -> TableMeta {
        TableMeta::new("widgets", ["id", "account_id", "name"], ["id"]).unwrap()
    }

    fn memberships_meta() -> TableMeta {
        TableMeta::new(
            "memberships",
            ["org_id", "user_id", "account_id", "role"],
            ["org_id", "user_id"],
        )
        .unwrap()
    }

    fn account(id: i64) -> TenantScope {
        TenantScope::for_tenant(CurrentTenant::new("Account", id), Arc::default())
    }

    fn ast_for(table: &str) -> QueryAst {
        let mut ast = QueryAst::new(TableSource::table(table));
        ast.push_projection(Expr::table_asterisk(Alias::new(table)).into());
        ast
    }

    fn render_delete(table: &str, predicate: SimpleExpr, backend: DbBackend) -> String {
        let mut stmt = Query::delete();
        stmt.from_table(Alias::new(table)).and_where(predicate);
        match backend {
            DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
            _ => stmt.to_string(PostgresQueryBuilder),
        }
    }

    #[test]
    fn test_single_key_membership() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);

        let predicate = engine.membership_predicate(&ast_for("widgets"), &account(7));
        let sql = render_delete("widgets", predicate, DbBackend::Postgres);
        assert_eq!(
            sql,
            r#"DELETE FROM "widgets" WHERE "widgets"."id" IN (SELECT "widgets"."id" FROM "widgets" WHERE "widgets"."account_id" = 7)"#
        );
    }

    #[test]
    fn test_composite_key_uses_row_values() {
        let meta = memberships_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);

        let predicate = engine.membership_predicate(&ast_for("memberships"), &account(1));
        let sql = render_delete("memberships", predicate, DbBackend::Postgres);
        assert!(
            sql.contains(
                r#"("memberships"."org_id", "memberships"."user_id") IN (SELECT "memberships"."org_id", "memberships"."user_id" FROM "memberships""#
            ),
            "{sql}"
        );
        assert!(sql.contains(r#""memberships"."account_id" = 1"#), "{sql}");
    }

    #[test]
    fn test_existing_tenant_predicate_is_not_duplicated() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);
        let ctx = account(7);

        let once = engine.scope(&ast_for("widgets"), &ctx);
        let twice = engine.scope(&once, &ctx);
        assert_eq!(once.constraints().len(), 1);
        assert_eq!(twice.constraints().len(), 1);
    }

    #[test]
    fn test_scope_does_not_mutate_input() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);
        let ast = ast_for("widgets");

        let _ = engine.scope(&ast, &account(7));
        assert!(ast.constraints().is_empty());
        assert_eq!(ast.projections().len(), 1);
    }

    #[test]
    fn test_scope_rebinds_aliased_source() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);

        let scoped = engine.scope(&QueryAst::new(TableSource::aliased("widgets", "w")), &account(7));
        assert_eq!(scoped.source(), &TableSource::table("widgets"));
    }

    #[test]
    #[traced_test]
    fn test_missing_partition_column_omits_predicate() {
        let meta = TableMeta::new("audit_events", ["id", "payload"], ["id"]).unwrap();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);

        let scoped = engine.scope(&ast_for("audit_events"), &account(7));
        assert!(scoped.constraints().is_empty());
        assert!(logs_contain("Partition key column missing"));
    }

    #[test]
    fn test_configured_partition_key() {
        let meta = TableMeta::new("widgets", ["id", "tenant_ref"], ["id"]).unwrap();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);
        let keys = Arc::new(PartitionKeys::default().with_key("Account", "tenant_ref"));
        let ctx = TenantScope::for_tenant(CurrentTenant::new("Account", "acme"), keys);

        let predicate = engine.membership_predicate(&ast_for("widgets"), &ctx);
        let sql = render_delete("widgets", predicate, DbBackend::Postgres);
        assert!(sql.contains(r#""widgets"."tenant_ref" = 'acme'"#), "{sql}");
    }

    #[test]
    fn test_mysql_wraps_subquery_in_derived_table() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::MySql, &opts);

        let predicate = engine.membership_predicate(&ast_for("widgets"), &account(7));
        let sql = render_delete("widgets", predicate, DbBackend::MySql);
        assert!(
            sql.contains("`widgets`.`id` IN (SELECT `__scoped_ids`.`id` FROM (SELECT `widgets`.`id` FROM `widgets`"),
            "{sql}"
        );
        assert!(sql.contains("AS `__scoped_ids`"), "{sql}");
    }

    #[test]
    fn test_mysql_wrap_can_be_disabled() {
        let meta = widgets_meta();
        let opts = ScopingOptions {
            mysql_derived_table: false,
            ..ScopingOptions::default()
        };
        let engine = SubqueryEngine::new(&meta, DbBackend::MySql, &opts);

        let predicate = engine.membership_predicate(&ast_for("widgets"), &account(7));
        let sql = render_delete("widgets", predicate, DbBackend::MySql);
        assert!(!sql.contains("__scoped_ids"), "{sql}");
    }

    #[test]
    fn test_unscoped_predicate_keeps_original_constraints() {
        let meta = widgets_meta();
        let opts = ScopingOptions::default();
        let engine = SubqueryEngine::new(&meta, DbBackend::Postgres, &opts);
        let mut ast = ast_for("widgets");
        ast.push_constraint(Expr::col((Alias::new("widgets"), Alias::new("name"))).eq("bolt"));

        let predicate = engine.unscoped_membership_predicate(&ast);
        let sql = render_delete("widgets", predicate, DbBackend::Postgres);
        assert!(sql.contains(r#""widgets"."name" = 'bolt'"#), "{sql}");
        assert!(!sql.contains("account_id"), "{sql}");
    }
}
