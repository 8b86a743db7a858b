//! Scoping options.

use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::ScopeError;

/// Figment key under which [`ScopingOptions`] is read.
pub const SCOPING_CONFIG_KEY: &str = "tenant_scope";

/// Tunables for statement assembly.
///
/// ```yaml
/// tenant_scope:
///   mysql_derived_table: true
///   subquery_alias: __scoped_ids
///   statement_label: SQL
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopingOptions {
    /// Wrap the membership subquery in a derived table on `MySQL`, which
    /// rejects a subquery that reads the table being deleted or updated.
    pub mysql_derived_table: bool,
    /// Alias of the derived table.
    pub subquery_alias: String,
    /// Label attached to execution log events.
    pub statement_label: String,
}

impl Default for ScopingOptions {
    fn default() -> Self {
        Self {
            mysql_derived_table: true,
            subquery_alias: "__scoped_ids".to_owned(),
            statement_label: "SQL".to_owned(),
        }
    }
}

impl ScopingOptions {
    /// Reads options from the `tenant_scope` section; defaults when absent.
    ///
    /// # Errors
    /// Returns `ScopeError::Config` if the section cannot be deserialized.
    pub fn from_figment(figment: &Figment) -> Result<Self, ScopeError> {
        if !figment.contains(SCOPING_CONFIG_KEY) {
            return Ok(Self::default());
        }
        Ok(figment.extract_inner(SCOPING_CONFIG_KEY)?)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    #[test]
    fn test_defaults_when_section_missing() {
        let figment = Figment::new();
        let opts = ScopingOptions::from_figment(&figment).unwrap();
        assert_eq!(opts, ScopingOptions::default());
        assert!(opts.mysql_derived_table);
        assert_eq!(opts.subquery_alias, "__scoped_ids");
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
            "tenant_scope": { "statement_label": "Widget Bulk" }
        })));

        let opts = ScopingOptions::from_figment(&figment).unwrap();
        assert_eq!(opts.statement_label, "Widget Bulk");
        assert!(opts.mysql_derived_table);
    }

    #[test]
    fn test_invalid_section() {
        let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
            "tenant_scope": { "mysql_derived_table": "sometimes" }
        })));

        let err = ScopingOptions::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ScopeError::Config(_)));
    }
}
