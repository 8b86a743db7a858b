//! Tenant class to partition-key column mapping.

use std::collections::HashMap;

use figment::Figment;
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Figment key under which [`TenancyConfig`] is read.
pub const TENANCY_CONFIG_KEY: &str = "tenancy";

/// Tenancy configuration section.
///
/// ```yaml
/// tenancy:
///   partition_keys:
///     Account: account_id
///     Organization: org_uuid
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancyConfig {
    #[serde(default)]
    pub partition_keys: HashMap<String, String>,
}

/// Registry resolving the partition-key column of a tenant class.
///
/// Classes without an explicit entry use `<snake_case(class)>_id`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionKeys {
    keys: HashMap<String, String>,
}

impl PartitionKeys {
    #[must_use]
    pub fn from_config(config: TenancyConfig) -> Self {
        Self {
            keys: config.partition_keys,
        }
    }

    /// Builds the registry from the `tenancy` section of a figment.
    ///
    /// A figment without a `tenancy` section yields an empty registry.
    ///
    /// # Errors
    /// Returns `ConfigError::Extract` if the section exists but cannot be deserialized.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        if !figment.contains(TENANCY_CONFIG_KEY) {
            return Ok(Self::default());
        }
        let config: TenancyConfig = figment
            .extract_inner(TENANCY_CONFIG_KEY)
            .map_err(|e| ConfigError::Extract(Box::new(e)))?;
        tracing::debug!(
            registered = config.partition_keys.len(),
            "Loaded tenant partition keys"
        );
        Ok(Self::from_config(config))
    }

    /// Registers an explicit partition key for a tenant class.
    #[must_use]
    pub fn with_key(mut self, tenant_class: impl Into<String>, column: impl Into<String>) -> Self {
        self.keys.insert(tenant_class.into(), column.into());
        self
    }

    /// Returns the partition-key column for `tenant_class`.
    #[must_use]
    pub fn partition_key(&self, tenant_class: &str) -> String {
        self.keys
            .get(tenant_class)
            .cloned()
            .unwrap_or_else(|| default_partition_key(tenant_class))
    }
}

fn default_partition_key(tenant_class: &str) -> String {
    // Module-qualified class names only contribute their last segment.
    let base = tenant_class.rsplit("::").next().unwrap_or(tenant_class);
    format!("{}_id", base.to_snake_case())
}
