use std::sync::Arc;

use tracing::warn;
use vibe_models::ChartArtifact;

use crate::api::BrokerApi;
use crate::sink::ArtifactSink;

/// Everything an adapter operation needs: the vendor seam and, optionally,
/// where side-channel charts go.
///
/// Cheap to clone; shared by all concurrent tool calls.
#[derive(Clone)]
pub struct AdapterContext {
    api: Arc<dyn BrokerApi>,
    sink: Option<Arc<dyn ArtifactSink>>,
}

impl AdapterContext {
    pub fn new(api: Arc<dyn BrokerApi>) -> Self {
        Self { api, sink: None }
    }

    pub fn with_artifact_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn api(&self) -> &dyn BrokerApi {
        self.api.as_ref()
    }

    pub fn charts_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Hand a chart to the sink. Returns whether it was accepted; failures are
    /// logged and otherwise ignored.
    pub async fn publish(&self, artifact: ChartArtifact) -> bool {
        let Some(sink) = &self.sink else {
            return false;
        };

        let filename = artifact.filename.clone();
        match sink.save(artifact).await {
            Ok(()) => true,
            Err(e) => {
                warn!(filename = %filename, error = %e, "Failed to save chart artifact");
                false
            }
        }
    }
}
