/// Errors raised while loading tenancy configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The `tenancy` section could not be deserialized.
    #[error("invalid tenancy configuration: {0}")]
    Extract(#[source] Box<figment::Error>),
}
