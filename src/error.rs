use thiserror::Error;

/// Failure while slicing one container out of a document. The extractor
/// logs these and moves on to the next container.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("invalid selector `{selector}` in `{site}` policy: {reason}")]
    InvalidSelector {
        site: &'static str,
        selector: &'static str,
        reason: String,
    },
    #[error("container is {size} bytes, limit is {limit}")]
    ContainerTooLarge { size: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}
