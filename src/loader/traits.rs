use crate::model::LoadError;
use std::path::Path;

#[async_trait::async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<String, LoadError>;
}
