//! Owned query AST of a relation.
//!
//! A relation's query is kept as plain parts (root source, joins, `WHERE`
//! conjuncts, projections) so the subquery engine can inspect and rewrite it
//! before lowering it to a `SeaQuery` [`SelectStatement`].

use sea_orm::sea_query::{
    Alias, ConditionalStatement, Expr, JoinType, PostgresQueryBuilder, Query,
    QueryStatementWriter, SelectStatement, SimpleExpr,
};

/// Join flavour supported in relation queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl From<JoinKind> for JoinType {
    fn from(kind: JoinKind) -> Self {
        match kind {
            JoinKind::Inner => JoinType::InnerJoin,
            JoinKind::Left => JoinType::LeftJoin,
        }
    }
}

/// Root source of a query: a table, optionally aliased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSource {
    pub table: String,
    pub alias: Option<String>,
}

impl TableSource {
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: None,
        }
    }

    #[must_use]
    pub fn aliased(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: Some(alias.into()),
        }
    }
}

/// A join clause.
#[derive(Clone, Debug)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub source: TableSource,
    pub on: SimpleExpr,
}

#[derive(Clone, Debug)]
pub struct QueryAst {
    source: TableSource,
    joins: Vec<JoinClause>,
    constraints: Vec<SimpleExpr>,
    projections: Vec<SimpleExpr>,
}

impl QueryAst {
    #[must_use]
    pub fn new(source: TableSource) -> Self {
        Self {
            source,
            joins: Vec::new(),
            constraints: Vec::new(),
            projections: Vec::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &TableSource {
        &self.source
    }

    /// Points the root source at `table`, dropping any alias.
    pub fn rebind_source(&mut self, table: &str) {
        self.source = TableSource::table(table);
    }

    #[must_use]
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    #[must_use]
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    pub fn push_join(&mut self, join: JoinClause) {
        self.joins.push(join);
    }

    #[must_use]
    pub fn constraints(&self) -> &[SimpleExpr] {
        &self.constraints
    }

    pub fn push_constraint(&mut self, constraint: SimpleExpr) {
        self.constraints.push(constraint);
    }

    /// Whether an equivalent constraint is already present.
    ///
    /// Equivalent means structurally equal, or rendering to the same SQL text.
    #[must_use]
    pub fn contains_constraint(&self, constraint: &SimpleExpr) -> bool {
        if self.constraints.iter().any(|c| c == constraint) {
            return true;
        }
        let rendered = canonical_sql(constraint);
        self.constraints
            .iter()
            .any(|c| canonical_sql(c) == rendered)
    }

    #[must_use]
    pub fn projections(&self) -> &[SimpleExpr] {
        &self.projections
    }

    pub fn clear_projections(&mut self) {
        self.projections.clear();
    }

    pub fn push_projection(&mut self, projection: SimpleExpr) {
        self.projections.push(projection);
    }

    /// Lowers the AST to a `SeaQuery` select.
    #[must_use]
    pub fn to_select(&self) -> SelectStatement {
        let mut select = Query::select();
        match &self.source.alias {
            Some(alias) => select.from_as(Alias::new(&self.source.table), Alias::new(alias)),
            None => select.from(Alias::new(&self.source.table)),
        };
        for projection in &self.projections {
            select.expr(projection.clone());
        }
        for join in &self.joins {
            match &join.source.alias {
                Some(alias) => select.join_as(
                    join.kind.into(),
                    Alias::new(&join.source.table),
                    Alias::new(alias),
                    join.on.clone(),
                ),
                None => select.join(
                    join.kind.into(),
                    Alias::new(&join.source.table),
                    join.on.clone(),
                ),
            };
        }
        for constraint in &self.constraints {
            select.and_where(constraint.clone());
        }
        select
    }
}

/// Column reference qualified by table name.
#[must_use]
pub fn qualified_column(table: &str, column: &str) -> SimpleExpr {
    Expr::col((Alias::new(table), Alias::new(column))).into()
}

/// Canonical textual form of a constraint, used for duplicate detection.
fn canonical_sql(constraint: &SimpleExpr) -> String {
    Query::select()
        .expr(Expr::val(1))
        .and_where(constraint.clone())
        .to_string(PostgresQueryBuilder)
}
