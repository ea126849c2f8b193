use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;
use vibe_models::ChartArtifact;

use crate::error::BrokerError;

/// Destination for side-channel chart artifacts.
///
/// Charts are descriptors; turning one into an image is the sink's business.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: ChartArtifact) -> Result<(), BrokerError>;
}

/// Logs each artifact hand-off and discards the chart.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

#[async_trait]
impl ArtifactSink for TracingSink {
    async fn save(&self, artifact: ChartArtifact) -> Result<(), BrokerError> {
        info!(
            filename = %artifact.filename,
            title = %artifact.chart.title,
            "Chart artifact generated"
        );
        Ok(())
    }
}

/// Writes each chart descriptor as `<stem>.json` into a directory, for an
/// external renderer to pick up.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, filename: &str) -> PathBuf {
        let stem = Path::new(filename)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        self.dir.join(format!("{stem}.json"))
    }
}

#[async_trait]
impl ArtifactSink for JsonFileSink {
    async fn save(&self, artifact: ChartArtifact) -> Result<(), BrokerError> {
        let path = self.path_for(&artifact.filename);
        let body = serde_json::to_vec_pretty(&artifact)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BrokerError::Artifact(format!("{}: {e}", self.dir.display())))?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| BrokerError::Artifact(format!("{}: {e}", path.display())))?;

        info!(path = %path.display(), "Chart descriptor written");
        Ok(())
    }
}
