//! Attribute assignments accepted by `update_all`.
//!
//! Two shapes are supported: an ordered column → expression mapping
//! ([`Assignments`]) and a raw `SET` fragment with `?` binds
//! ([`RawAssignment`]). Both lower to validated `(column, expression)` pairs.

use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr, Value};
use sea_orm::{ColumnTrait, DbBackend, IdenStatic};

use crate::ScopeError;
use crate::entity_traits::TableMeta;

/// Ordered column → expression mapping.
///
/// Setting the same column twice keeps the first position and the last value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assignments {
    entries: Vec<(String, SimpleExpr)>,
}

impl Assignments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a typed entity column.
    #[must_use]
    pub fn set<C: ColumnTrait>(self, column: C, value: impl Into<SimpleExpr>) -> Self {
        self.set_named(column.as_str(), value)
    }

    /// Assigns a column by name.
    #[must_use]
    pub fn set_named(mut self, column: impl Into<String>, value: impl Into<SimpleExpr>) -> Self {
        self.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == column)
    }

    /// Appends `column = COALESCE(column, 0) + 1`.
    pub(crate) fn push_locking_increment(&mut self, column: &str) {
        let current = Func::coalesce([Expr::col(Alias::new(column)).into(), Expr::val(0).into()]);
        self.insert(column.to_owned(), Expr::expr(current).add(1));
    }

    fn insert(&mut self, column: String, value: SimpleExpr) {
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    fn lower(self, meta: &TableMeta) -> Result<Vec<(String, SimpleExpr)>, ScopeError> {
        for (column, _) in &self.entries {
            ensure_column(meta, column)?;
        }
        Ok(self.entries)
    }
}

/// Raw `SET` fragment such as `"name = ?, hits = hits + 1"`.
///
/// Positional `?` binds are consumed left to right across the fragment's
/// comma-separated assignments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawAssignment {
    sql: String,
    values: Vec<Value>,
}

impl RawAssignment {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn lower(
        self,
        meta: &TableMeta,
        backend: DbBackend,
    ) -> Result<Vec<(String, SimpleExpr)>, ScopeError> {
        let mut values = self.values.into_iter();
        let mut lowered = Vec::new();

        for segment in split_top_level(&self.sql, ',') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(ScopeError::InvalidAssignment(format!(
                    "empty assignment in `{}`",
                    self.sql
                )));
            }
            let Some((column, expr)) = split_once_top_level(segment, '=') else {
                return Err(ScopeError::InvalidAssignment(format!(
                    "expected `column = expression`, got `{segment}`"
                )));
            };
            let column = unquote(column.trim());
            let expr = expr.trim();
            if column.is_empty() || expr.is_empty() {
                return Err(ScopeError::InvalidAssignment(format!(
                    "expected `column = expression`, got `{segment}`"
                )));
            }
            ensure_column(meta, column)?;

            let (expr, wanted) = number_placeholders(expr, backend)?;
            let binds: Vec<Value> = values.by_ref().take(wanted).collect();
            if binds.len() != wanted {
                return Err(ScopeError::InvalidAssignment(format!(
                    "not enough bind values for `{}`",
                    self.sql
                )));
            }
            lowered.push((column.to_owned(), Expr::cust_with_values(expr, binds)));
        }

        if values.next().is_some() {
            return Err(ScopeError::InvalidAssignment(format!(
                "too many bind values for `{}`",
                self.sql
            )));
        }
        Ok(lowered)
    }
}

/// Changes requested by `update_all`.
#[derive(Clone, Debug, PartialEq)]
pub enum Updates {
    Assign(Assignments),
    Raw(RawAssignment),
}

impl Updates {
    /// Fails with `ScopeError::EmptyUpdate` when there is nothing to change.
    pub(crate) fn ensure_not_empty(&self) -> Result<(), ScopeError> {
        let empty = match self {
            Updates::Assign(assignments) => assignments.is_empty(),
            Updates::Raw(raw) => raw.sql.trim().is_empty(),
        };
        if empty {
            return Err(ScopeError::EmptyUpdate);
        }
        Ok(())
    }

    /// Validated `(column, expression)` pairs in assignment order.
    pub(crate) fn lower(
        self,
        meta: &TableMeta,
        backend: DbBackend,
    ) -> Result<Vec<(String, SimpleExpr)>, ScopeError> {
        self.ensure_not_empty()?;
        match self {
            Updates::Assign(assignments) => assignments.lower(meta),
            Updates::Raw(raw) => raw.lower(meta, backend),
        }
    }
}

impl From<Assignments> for Updates {
    fn from(assignments: Assignments) -> Self {
        Updates::Assign(assignments)
    }
}

impl From<RawAssignment> for Updates {
    fn from(raw: RawAssignment) -> Self {
        Updates::Raw(raw)
    }
}

impl From<&str> for Updates {
    fn from(sql: &str) -> Self {
        Updates::Raw(RawAssignment::new(sql))
    }
}

impl From<String> for Updates {
    fn from(sql: String) -> Self {
        Updates::Raw(RawAssignment::new(sql))
    }
}

fn ensure_column(meta: &TableMeta, column: &str) -> Result<(), ScopeError> {
    if meta.has_column(column) {
        return Ok(());
    }
    Err(ScopeError::UnknownColumn {
        table: meta.table().to_owned(),
        column: column.to_owned(),
    })
}

/// Splits on `sep` outside parentheses and quoted text.
fn split_top_level(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == sep && depth == 0 => {
                parts.push(&input[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Splits at the first top-level `sep`.
fn split_once_top_level(input: &str, sep: char) -> Option<(&str, &str)> {
    let head = split_top_level(input, sep).into_iter().next()?;
    if head.len() == input.len() {
        return None;
    }
    Some((head, &input[head.len() + sep.len_utf8()..]))
}

/// Counts `?` placeholders outside quoted text, rewriting them to `$n` on
/// Postgres where `?` is an operator rather than a bind marker.
///
/// An unquoted `$` is rejected on Postgres: the statement builder reads it as
/// a bind marker of its own.
fn number_placeholders(expr: &str, backend: DbBackend) -> Result<(String, usize), ScopeError> {
    let mut quote: Option<char> = None;
    let mut count = 0;
    let mut out = String::with_capacity(expr.len());
    for ch in expr.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, '$') if backend == DbBackend::Postgres => {
                return Err(ScopeError::InvalidAssignment(format!(
                    "`$` markers are not supported in `{expr}`; bind values with `?`"
                )));
            }
            (None, '?') => {
                count += 1;
                if backend == DbBackend::Postgres {
                    out.push('$');
                    out.push_str(&count.to_string());
                    continue;
                }
            }
            _ => {}
        }
        out.push(ch);
    }
    Ok((out, count))
}

/// Strips identifier quoting and any table qualifier.
fn unquote(column: &str) -> &str {
    let column = column.rsplit('.').next().unwrap_or(column);
    column.trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
}
