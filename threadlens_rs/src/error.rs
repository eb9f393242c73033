//! Errors of the loading layer. The analyzer itself never fails.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ThreadlensError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pool config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("unsupported pool config format {} (expected .json or .toml)", path.display())]
    UnsupportedConfigFormat { path: PathBuf },

    #[error("no thread dumps named threaddump-<N>-<digits>.txt in {}", dir.display())]
    NoSnapshots { dir: PathBuf },
}
