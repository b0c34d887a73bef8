use super::traits::Loader;
use crate::model::LoadError;
use std::io::ErrorKind;
use std::path::Path;

/// Reads rate-card text from the local filesystem.
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Loader for FileLoader {
    async fn load(&self, path: &Path) -> Result<String, LoadError> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(LoadError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
