use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] yamlnav::ConfigError),

    #[error(transparent)]
    Host(#[from] yamlnav::HostError),

    #[error(transparent)]
    Scan(#[from] yamlnav_project::ScanError),

    #[error(transparent)]
    Edit(#[from] yamlnav::EditError),

    #[error(transparent)]
    Nav(#[from] yamlnav::NavError),

    #[error("failed to resolve {path}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type CliResult<T> = std::result::Result<T, CliError>;
