use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage access failed for {path}: {source}")]
    StorageAccess {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed content in {path}: {detail}")]
    MalformedContent { path: String, detail: String },

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    #[error("duplicate chapter id {id} in class {class_type}")]
    DuplicateId { class_type: String, id: String },

    #[error("failed to encode JSON: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn storage(path: impl Into<String>, source: io::Error) -> Self {
        Self::StorageAccess {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedContent {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            id: id.into(),
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
