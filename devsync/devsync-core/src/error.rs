//! Error types for the devsync engine.

/// Result type alias for devsync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Main error type for the devsync engine.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The expected project layout is missing
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Key retrieval or network account creation failed
    #[error("Account creation error: {0}")]
    AccountCreation(String),

    /// Contract source could not be read
    #[error("Contract read error: {0}")]
    ContractRead(String),

    /// Contract source has no resolvable name
    #[error("Contract parse error: {0}")]
    ContractParse(String),

    /// Saving the project state failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The deployer reported an aggregate failure
    #[error("Deployment error: {0}")]
    Deployment(String),

    /// Not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Invalid key material
    #[error("Key error: {0}")]
    Key(String),

    /// File watching errors
    #[error("Watch error: {0}")]
    Watch(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped error with additional context
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Wrapped anyhow errors for compatibility
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Create a new initialization error
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a new account creation error
    pub fn account_creation(msg: impl Into<String>) -> Self {
        Self::AccountCreation(msg.into())
    }

    /// Create a new contract read error
    pub fn contract_read(msg: impl Into<String>) -> Self {
        Self::ContractRead(msg.into())
    }

    /// Create a new contract parse error
    pub fn contract_parse(msg: impl Into<String>) -> Self {
        Self::ContractParse(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new deployment error
    pub fn deployment(msg: impl Into<String>) -> Self {
        Self::Deployment(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a new key error
    pub fn key(msg: impl Into<String>) -> Self {
        Self::Key(msg.into())
    }

    /// Create a new watch error
    pub fn watch(msg: impl Into<String>) -> Self {
        Self::Watch(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap this error with a context message.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root(&self) -> &SyncError {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), Self::NotFound { .. })
    }

    /// Check if this is an initialization error
    pub fn is_initialization(&self) -> bool {
        matches!(self.root(), Self::Initialization(_))
    }

    /// Check if this is an account creation error
    pub fn is_account_creation(&self) -> bool {
        matches!(self.root(), Self::AccountCreation(_))
    }

    /// Check if contract source could not be read or parsed
    pub fn is_contract_source(&self) -> bool {
        matches!(self.root(), Self::ContractRead(_) | Self::ContractParse(_))
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self.root(), Self::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_root() {
        let err = SyncError::not_found("account", "alice").context("failed updating accounts");
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "failed updating accounts: Not found: account with id alice"
        );
    }

    #[test]
    fn test_nested_context() {
        let err = SyncError::contract_parse("no contract declaration")
            .context("failed to remove contract")
            .context("watch loop stopped");
        assert!(err.is_contract_source());
        assert!(!err.is_persistence());
    }
}
