//! Pre-flight checks before expensive operations.
//!
//! Validates inputs and credentials up front so a run does not fail after
//! paying for embedding calls.

use crate::config::Settings;
use crate::error::{GitRagError, Result};
use crate::secrets::{resolve_api_key, SecretSource};
use std::path::Path;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation<'a> {
    /// Building needs a readable stream and an API key.
    Build { stream: &'a Path },
    /// Asking needs a built index and an API key.
    Ask { index: &'a Path },
}

/// Run pre-flight checks and return the API key.
///
/// For questions, a missing index is reported before a missing key.
pub fn check(
    operation: Operation<'_>,
    settings: &Settings,
    secrets: &dyn SecretSource,
) -> Result<String> {
    match operation {
        Operation::Build { stream } => {
            if !stream.is_file() {
                return Err(GitRagError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("commit stream not found: {}", stream.display()),
                )));
            }
        }
        Operation::Ask { index } => {
            if !index.is_file() {
                return Err(GitRagError::IndexNotFound(index.to_path_buf()));
            }
        }
    }
    resolve_api_key(secrets, &settings.secrets)
}
