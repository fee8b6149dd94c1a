use mcp_common::error::CommonError;

use crate::index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("config error: {0}")]
    Config(String),
}
