// Re-export modules
pub mod analysis;
pub mod bridge;
pub mod config;
pub mod debounce;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod page;
pub mod parsers;
pub mod title;
pub mod translations;

// Re-export commonly used types for convenience
pub use config::PanelConfig;
pub use error::PanelError;
pub use orchestrator::{PanelState, PreviewOrchestrator};
pub use page::{DocumentId, EditorData, EditorField, PageSnapshot};

use analysis::EngineFactory;
use analysis::width::{self, TitleWidth};
use bridge::{EditorFieldBridge, EditorRegistry, HostDocument, MemoryDocument, NoEditors};
use fetch::{HttpPreviewSource, PreviewSource};
use std::sync::Arc;

/// Main builder for the analysis panel of one edited document
pub struct Panel {
    config: PanelConfig,
    engines: Arc<dyn EngineFactory>,
    document: Option<DocumentId>,
    source: Option<Arc<dyn PreviewSource>>,
    resources: Option<Arc<dyn PreviewSource>>,
    host: Option<Arc<dyn HostDocument>>,
    editors: Option<Arc<dyn EditorRegistry>>,
    title_width: Option<Arc<dyn TitleWidth>>,
}

impl Panel {
    /// Create a new Panel builder for the given configuration and analysis engine
    pub fn new(config: PanelConfig, engines: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            engines,
            document: None,
            source: None,
            resources: None,
            host: None,
            editors: None,
            title_width: None,
        }
    }

    /// Load configuration from a file
    pub fn with_config_file(
        engines: Arc<dyn EngineFactory>,
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, error::ConfigError> {
        Ok(Self::new(PanelConfig::from_file(path)?, engines))
    }

    /// Set the identity of the edited document (defaults to the page URL)
    pub fn with_document(mut self, document: DocumentId) -> Self {
        self.document = Some(document);
        self
    }

    /// Set where previews are fetched from (defaults to plain HTTP)
    pub fn with_source(mut self, source: Arc<dyn PreviewSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set where translation bundles and favicons are fetched from (defaults to plain HTTP)
    pub fn with_resources(mut self, resources: Arc<dyn PreviewSource>) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Set the host document edits are written to
    pub fn with_host(mut self, host: Arc<dyn HostDocument>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the registry of rich-text editors attached to the host document
    pub fn with_editors(mut self, editors: Arc<dyn EditorRegistry>) -> Self {
        self.editors = Some(editors);
        self
    }

    /// Override the configured title width strategy
    pub fn with_title_width(mut self, title_width: Arc<dyn TitleWidth>) -> Self {
        self.title_width = Some(title_width);
        self
    }

    pub fn build(self) -> PreviewOrchestrator {
        let document = self
            .document
            .unwrap_or_else(|| DocumentId(self.config.page_url.clone()));
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(HttpPreviewSource::new()));
        let resources = self
            .resources
            .unwrap_or_else(|| Arc::new(HttpPreviewSource::new()));
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(MemoryDocument::new()));
        let editors = self.editors.unwrap_or_else(|| Arc::new(NoEditors));
        let title_width = self
            .title_width
            .unwrap_or_else(|| width::from_config(self.config.title_width));

        let bridge = EditorFieldBridge::new(host, editors, self.config.field_write_debounce());
        PreviewOrchestrator::new(
            self.config,
            document,
            source,
            resources,
            self.engines,
            bridge,
            title_width,
        )
    }
}
