/// Errors that can occur while loading the catalog or parsing parameters.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The action id does not exist in the catalog.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The parameters payload does not match the action's schema.
    #[error("invalid parameters for {action}: {reason}")]
    InvalidParameters {
        /// The action whose schema was violated.
        action: String,
        /// What was wrong with the payload.
        reason: String,
    },

    /// The catalog overlay config could not be parsed.
    #[error("invalid catalog config: {0}")]
    Config(String),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
