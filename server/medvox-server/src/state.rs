use error_common::{MedvoxError, Result};
use records_store::{PostgrestBackend, RecordsBackend};
use records_tools::{Dispatcher, OpenAiToolSelector, RecordQueries, ToolSelector, ToolsRegistry};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use voice_recognition_service::VoiceService;

use crate::config::{PipelineTimeouts, ServerConfig, DEFAULT_MAX_UPLOAD_BYTES};

/// Shared handles, built once at startup and cloned into every handler
#[derive(Clone)]
pub struct AppState {
    pub voice: VoiceService,
    pub selector: Arc<dyn ToolSelector>,
    pub dispatcher: Dispatcher,
    pub registry: Arc<ToolsRegistry>,
    pub timeouts: PipelineTimeouts,
    pub max_upload_bytes: usize,
    pub started_at: Instant,
}

impl AppState {
    /// Assemble state from explicitly constructed collaborators
    pub fn new(
        voice: VoiceService,
        selector: Arc<dyn ToolSelector>,
        backend: Arc<dyn RecordsBackend>,
        timeouts: PipelineTimeouts,
    ) -> Self {
        let dispatcher = Dispatcher::new(RecordQueries::new(backend)).with_call_timeout(timeouts.tool_call);
        Self {
            voice,
            selector,
            dispatcher,
            registry: Arc::new(ToolsRegistry::new()),
            timeouts,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            started_at: Instant::now(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Build every client from configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let voice = VoiceService::new(config.voice.clone()).map_err(|e| MedvoxError::classified(&e))?;
        let registry = ToolsRegistry::new();
        let selector = OpenAiToolSelector::new(config.selector.clone(), &registry)
            .map_err(|e| MedvoxError::classified(&e))?;
        let backend = PostgrestBackend::new(&config.backend).map_err(|e| MedvoxError::classified(&e))?;

        info!(
            voice_provider = voice.provider_name(),
            model = selector.model(),
            tools = registry.list().len(),
            "Application state initialized"
        );

        Ok(Self::new(voice, Arc::new(selector), Arc::new(backend), config.timeouts)
            .with_max_upload_bytes(config.max_upload_bytes))
    }
}
