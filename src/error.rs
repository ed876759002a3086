use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Index is being rebuilt")]
    IndexNotReady,

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("MCP error: {0}")]
    Mcp(String),
}

impl LookupError {
    /// Short `Variant: message` form carried in result diagnostics.
    pub fn diagnostic(&self) -> String {
        let variant = match self {
            LookupError::Io(_) => "Io",
            LookupError::Database(_) => "Database",
            LookupError::Archive(_) => "Archive",
            LookupError::InvalidQuery(_) => "InvalidQuery",
            LookupError::IndexNotReady => "IndexNotReady",
            LookupError::Manifest(_) => "Manifest",
            LookupError::Index(_) => "Index",
            LookupError::Mcp(_) => "Mcp",
        };
        format!("{}: {}", variant, self)
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
