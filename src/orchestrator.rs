use crate::analysis::width::TitleWidth;
use crate::analysis::{
    AnalysisOutcome, AnalysisResult, AnalysisSession, EngineConfig, EngineFactory, Paper,
    ScoreSummary,
};
use crate::bridge::EditorFieldBridge;
use crate::config::PanelConfig;
use crate::debounce::Debouncer;
use crate::error::PanelError;
use crate::fetch::{PreviewSource, resolve_favicon};
use crate::page::{DocumentId, EditorData, EditorField, PageSnapshot};
use crate::parsers::extract_page;
use crate::title::TitleTemplate;
use crate::translations::{self, Translations};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Everything the panel renders
#[derive(Debug, Clone, Serialize)]
pub struct PanelState {
    /// Document being edited
    pub document: DocumentId,
    pub editor: EditorData,
    pub snapshot: Option<Arc<PageSnapshot>>,
    pub title_template: TitleTemplate,
    pub first_load_complete: bool,
    pub is_loading: bool,
    pub is_analyzing: bool,
    /// Message of the last failed preview cycle
    pub error: Option<String>,
    pub favicon: Option<String>,
    pub seo: ScoreSummary,
    pub readability: ScoreSummary,
    /// Document the summaries were computed for
    pub analyzed_document: Option<DocumentId>,
    /// Latest results of both analyses by identifier
    pub all_results: BTreeMap<String, AnalysisResult>,

    /// Host values of the edited document
    #[serde(skip)]
    config: Arc<PanelConfig>,
    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    load_queued: bool,
    #[serde(skip)]
    analysis_queued: bool,
    #[serde(skip)]
    translations: Translations,
}

impl PanelState {
    fn new(document: DocumentId, config: Arc<PanelConfig>) -> Self {
        Self {
            document,
            editor: EditorData::from_config(&config),
            snapshot: None,
            title_template: TitleTemplate::identity(),
            first_load_complete: false,
            is_loading: false,
            is_analyzing: false,
            error: None,
            favicon: None,
            seo: ScoreSummary::default(),
            readability: ScoreSummary::default(),
            analyzed_document: None,
            all_results: BTreeMap::new(),
            config,
            generation: 0,
            load_queued: false,
            analysis_queued: false,
            translations: Translations::empty(),
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.document == ticket.document && self.generation == ticket.generation
    }
}

/// Title, URL and description as the snippet preview shows them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnippetPreview {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Identifies the document state an asynchronous step started from
#[derive(Debug, Clone)]
struct Ticket {
    document: DocumentId,
    generation: u64,
}

struct Inner {
    source: Arc<dyn PreviewSource>,
    resources: Arc<dyn PreviewSource>,
    session: AnalysisSession,
    bridge: Arc<EditorFieldBridge>,
    width: Arc<dyn TitleWidth>,
    refresh: Debouncer,
    state: Mutex<PanelState>,
}

/// Drives the preview, extract, analyze, classify cycle for the edited document.
///
/// Previews come from `source`; translation bundles and favicons from `resources`.
/// Cheap to clone; clones share the same panel.
#[derive(Clone)]
pub struct PreviewOrchestrator {
    inner: Arc<Inner>,
}

impl PreviewOrchestrator {
    pub(crate) fn new(
        config: PanelConfig,
        document: DocumentId,
        source: Arc<dyn PreviewSource>,
        resources: Arc<dyn PreviewSource>,
        engines: Arc<dyn EngineFactory>,
        bridge: EditorFieldBridge,
        width: Arc<dyn TitleWidth>,
    ) -> Self {
        let refresh = Debouncer::new(config.preview_refresh_debounce());
        Self {
            inner: Arc::new(Inner {
                session: AnalysisSession::new(engines),
                bridge: Arc::new(bridge),
                state: Mutex::new(PanelState::new(document, Arc::new(config))),
                source,
                resources,
                width,
                refresh,
            }),
        }
    }

    /// Configuration of the document currently edited
    pub fn config(&self) -> Arc<PanelConfig> {
        Arc::clone(&self.lock().config)
    }

    /// Copy of the current panel state
    pub fn state(&self) -> PanelState {
        self.lock().clone()
    }

    /// Loads the translation bundle, then runs the first preview cycle
    pub async fn start(&self) -> Result<(), PanelError> {
        let config = self.config();
        if let Some(url) = &config.translations_url {
            let bundle = translations::load(self.inner.resources.as_ref(), url).await;
            self.lock().translations = bundle;
        }
        self.load_page_content().await
    }

    /// Fetches and extracts the preview, then analyses it.
    ///
    /// A call arriving while another load is outstanding is queued and served once
    /// that load ends. A failed fetch or extraction is recorded in the panel state
    /// and no analysis runs.
    pub async fn load_page_content(&self) -> Result<(), PanelError> {
        loop {
            let Some(result) = self.load_once().await else {
                return Ok(());
            };

            let queued = std::mem::take(&mut self.lock().load_queued);
            if !queued {
                return result;
            }
            ::log::debug!("Serving queued preview load");
        }
    }

    /// One preview cycle; `None` when the call only queued another load
    async fn load_once(&self) -> Option<Result<(), PanelError>> {
        let (ticket, config, first_load) = {
            let mut state = self.lock();
            if state.is_loading {
                ::log::debug!("Preview load already in progress, queued");
                state.load_queued = true;
                return None;
            }
            state.is_loading = true;
            state.is_analyzing = true;
            (
                self.ticket(&state),
                Arc::clone(&state.config),
                !state.first_load_complete,
            )
        };

        ::log::info!("Loading preview {}", config.preview_url);
        let snapshot = match self.fetch_snapshot(&config).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let mut state = self.lock();
                if state.is_current(&ticket) {
                    ::log::error!("Preview cycle for {} failed: {}", ticket.document, e);
                    state.is_loading = false;
                    state.is_analyzing = false;
                    state.error = Some(e.to_string());
                }
                return Some(Err(e));
            }
        };

        let favicon = if first_load {
            resolve_favicon(
                self.inner.resources.as_ref(),
                &config.page_url,
                &snapshot.favicon_hint,
                config.favicon_src.as_deref(),
            )
            .await
        } else {
            None
        };

        {
            let mut state = self.lock();
            if !state.is_current(&ticket) {
                ::log::warn!("Discarding preview loaded for {}", ticket.document);
                return Some(Ok(()));
            }
            if !state.first_load_complete {
                state.title_template = TitleTemplate::derive(&state.editor.title, &snapshot.title);
                state.favicon = favicon;
                state.first_load_complete = true;
                ::log::debug!("Title template: {}", state.title_template.as_str());
            }
            state.snapshot = Some(Arc::new(snapshot));
            state.all_results.clear();
            state.error = None;
            state.is_loading = false;
        }

        self.refresh_analysis().await;
        Some(Ok(()))
    }

    /// Schedules a preview load once edits have been idle for the refresh delay
    pub fn request_preview_refresh(&self) {
        let this = self.clone();
        self.inner.refresh.schedule(async move {
            // Failures are already recorded in the panel state
            let _ = this.load_page_content().await;
        });
    }

    /// Analyses the current snapshot and publishes the grouped results.
    ///
    /// A request arriving while an analysis is in flight is queued and served once
    /// that analysis ends. Results for a document that is no longer current are
    /// discarded.
    pub async fn refresh_analysis(&self) {
        loop {
            let Some((ticket, config, paper)) = self.analysis_request() else {
                return;
            };

            match self.inner.session.run(&config, &paper).await {
                Ok(outcome) => self.publish(&ticket, outcome),
                Err(busy) => {
                    ::log::debug!("Analysis queued: {}", busy);
                    self.lock().analysis_queued = true;
                    return;
                }
            }

            let queued = std::mem::take(&mut self.lock().analysis_queued);
            if !queued {
                return;
            }
        }
    }

    /// Applies an edit: the panel state changes now, the host document after the
    /// field has been idle for the write delay, and the preview after that
    pub fn update_editor_data(&self, field: EditorField, value: String) {
        self.lock().editor.set(field, value.clone());

        let this = self.clone();
        self.inner
            .bridge
            .schedule_write(field, value, async move { this.request_preview_refresh() });
    }

    /// Moves the panel to another document, described by the host values in `config`.
    ///
    /// Pending writes and refreshes are dropped, and results still in flight for the
    /// previous document will be discarded. The next load fetches the new document's
    /// preview, derives a fresh title template and creates a fresh engine handle.
    /// Debounce delays and the title width strategy stay those the panel was built with.
    pub async fn switch_document(&self, document: DocumentId, config: PanelConfig) {
        self.inner.refresh.cancel();
        self.inner.bridge.cancel_pending();
        {
            let mut state = self.lock();
            ::log::info!("Switching from {} to {}", state.document, document);
            let translations = std::mem::take(&mut state.translations);
            let generation = state.generation + 1;
            *state = PanelState {
                generation,
                translations,
                ..PanelState::new(document, Arc::new(config))
            };
        }
        self.inner.session.reset().await;
    }

    /// Snippet title for the current editor title
    pub fn rendered_title(&self) -> String {
        let state = self.lock();
        state.title_template.render(&state.editor.title)
    }

    pub fn snippet_preview(&self) -> SnippetPreview {
        let state = self.lock();
        let config = &state.config;
        SnippetPreview {
            title: state.title_template.render(&state.editor.title),
            url: if config.is_homepage {
                config.base_url.clone()
            } else {
                state.editor.url.clone()
            },
            description: state.editor.description.clone(),
        }
    }

    async fn fetch_snapshot(&self, config: &PanelConfig) -> Result<PageSnapshot, PanelError> {
        let html = self.inner.source.fetch_text(&config.preview_url).await?;
        Ok(extract_page(&html, Some(&config.content_selector))?)
    }

    fn analysis_request(&self) -> Option<(Ticket, EngineConfig, Paper)> {
        let mut state = self.lock();
        let Some(snapshot) = state.snapshot.clone() else {
            ::log::debug!("No preview to analyse yet");
            return None;
        };
        state.is_analyzing = true;

        let config = &state.config;
        let engine_config = EngineConfig::new(
            config.is_cornerstone,
            &snapshot.locale,
            &config.engine_log_level,
            state.translations.clone(),
        );
        let paper = Paper {
            raw_content: snapshot.content.clone(),
            focus_keyword: state.editor.focus_keyword.clone(),
            description: snapshot.description.clone(),
            title: snapshot.title.clone(),
            title_render_width: self.inner.width.measure(&snapshot.title),
            url: url_path(&config.page_url),
            locale: snapshot.locale.clone(),
        };
        Some((self.ticket(&state), engine_config, paper))
    }

    fn publish(&self, ticket: &Ticket, outcome: AnalysisOutcome) {
        let mut state = self.lock();
        if !state.is_current(ticket) {
            ::log::warn!("Discarding analysis results for {}", ticket.document);
            return;
        }

        let config = Arc::clone(&state.config);
        state.seo = ScoreSummary::from_result_set(&outcome.seo, &config.seo_result_filter);
        state.readability = ScoreSummary::from_result_set(&outcome.readability, &[]);
        state.all_results = outcome
            .seo
            .results
            .into_iter()
            .chain(outcome.readability.results)
            .map(|result| (result.identifier.clone(), result))
            .collect();
        state.analyzed_document = Some(ticket.document.clone());
        state.is_analyzing = false;
        ::log::info!(
            "Analysis of {} complete: {} SEO and {} readability results",
            ticket.document,
            state.seo.results.len(),
            state.readability.results.len()
        );
    }

    fn ticket(&self, state: &PanelState) -> Ticket {
        Ticket {
            document: state.document.clone(),
            generation: state.generation,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn url_path(page_url: &str) -> String {
    Url::parse(page_url)
        .map(|url| url.path().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Panel;
    use crate::analysis::{
        AnalysisEngine, ENGINE_ERROR_TEXT, EngineResponse, RawAssessment, RawResultSet,
    };
    use crate::bridge::MemoryDocument;
    use crate::error::{EngineError, FetchError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    const PREVIEW: &str = "https://cms.test/preview";
    const PAGE: &str = "https://site.test/about/team";

    fn page_html(title: &str) -> String {
        format!(
            r#"<html lang="de-DE"><head><title>{}</title>
            <meta name="description" content="Who we are">
            <link rel="icon" href="/favicon.ico"></head>
            <body><main data-node="x"><p>Our team writes Rust.</p></main></body></html>"#,
            title
        )
    }

    const CONTACT_PREVIEW: &str = "https://cms.test/preview/contact";
    const CONTACT_PAGE: &str = "https://site.test/contact";
    const TRANSLATIONS: &str = "https://cms.test/i18n/de.json";

    /// Serves canned bodies; preview URLs are counted and can be held on `gate`
    #[derive(Default)]
    struct FakeSource {
        bodies: Mutex<HashMap<String, String>>,
        fetched: Mutex<Vec<String>>,
        preview_fetches: AtomicUsize,
        gate: Mutex<Option<Arc<Notify>>>,
    }

    impl FakeSource {
        fn with_preview(html: &str) -> Arc<Self> {
            let source = Arc::new(Self::default());
            source.set_body(PREVIEW, html);
            source
        }

        fn set_body(&self, url: &str, body: &str) {
            self.bodies
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_string());
        }

        fn fetches(&self) -> usize {
            self.preview_fetches.load(Ordering::SeqCst)
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PreviewSource for FakeSource {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            if url.contains("/preview") {
                self.preview_fetches.fetch_add(1, Ordering::SeqCst);
                let gate = self.gate.lock().unwrap().clone();
                if let Some(gate) = gate {
                    gate.notified().await;
                }
            }
            let body = self.bodies.lock().unwrap().get(url).cloned();
            body.ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 500,
                reason: "Internal Server Error".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct FakeEngine {
        papers: Mutex<Vec<Paper>>,
        configs: Mutex<Vec<EngineConfig>>,
        fail: AtomicBool,
        gate: Mutex<Option<Arc<Notify>>>,
    }

    impl FakeEngine {
        fn analyses(&self) -> usize {
            self.papers.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AnalysisEngine for FakeEngine {
        async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError> {
            self.configs.lock().unwrap().push(config.clone());
            Ok(())
        }

        async fn analyze(&self, paper: &Paper) -> Result<EngineResponse, EngineError> {
            self.papers.lock().unwrap().push(paper.clone());
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(EngineError::Rejected("malformed content".to_string()));
            }
            let assessment = |id: &str, score: f64| RawAssessment {
                identifier: id.to_string(),
                score: Some(score),
                text: format!("{} assessed", id),
                has_marks: false,
                marks: Vec::new(),
            };
            Ok(EngineResponse {
                seo: RawResultSet {
                    score: Some(72.0),
                    results: vec![
                        assessment("keyphraseLength", 9.0),
                        assessment("metaDescriptionKeyword", 5.0),
                    ],
                },
                readability: RawResultSet {
                    score: Some(20.0),
                    results: vec![assessment("textLength", 1.0)],
                },
            })
        }
    }

    struct SharedEngine(Arc<FakeEngine>);

    impl EngineFactory for SharedEngine {
        fn create(&self) -> Result<Arc<dyn AnalysisEngine>, EngineError> {
            Ok(self.0.clone())
        }
    }

    struct Fixture {
        panel: PreviewOrchestrator,
        source: Arc<FakeSource>,
        engine: Arc<FakeEngine>,
        host: Arc<MemoryDocument>,
    }

    fn fixture_with(config: PanelConfig, source: Arc<FakeSource>) -> Fixture {
        fixture_with_resources(config, source.clone(), source)
    }

    fn fixture_with_resources(
        config: PanelConfig,
        source: Arc<FakeSource>,
        resources: Arc<FakeSource>,
    ) -> Fixture {
        let engine = Arc::new(FakeEngine::default());
        let host = Arc::new(
            MemoryDocument::new()
                .with_property("titleOverride", "Home Page")
                .with_property("focusKeyword", ""),
        );
        let panel = Panel::new(config, Arc::new(SharedEngine(engine.clone())))
            .with_source(source.clone())
            .with_resources(resources)
            .with_host(host.clone())
            .build();
        Fixture {
            panel,
            source,
            engine,
            host,
        }
    }

    fn config() -> PanelConfig {
        let mut config = PanelConfig::new(PREVIEW, PAGE);
        config.title = "Home Page".to_string();
        config.content_selector = "main".to_string();
        config
    }

    fn contact_config() -> PanelConfig {
        let mut config = PanelConfig::new(CONTACT_PREVIEW, CONTACT_PAGE);
        config.title = "Contact".to_string();
        config.content_selector = "main".to_string();
        config
    }

    fn fixture() -> Fixture {
        fixture_with(config(), FakeSource::with_preview(&page_html("Home Page — My Site")))
    }

    #[tokio::test]
    async fn test_first_load_populates_panel() {
        let f = fixture();
        f.source.set_body("https://site.test/favicon.ico", "icon");
        f.panel.start().await.unwrap();

        let state = f.panel.state();
        assert!(state.first_load_complete);
        assert!(!state.is_loading);
        assert!(!state.is_analyzing);
        assert_eq!(state.error, None);
        assert_eq!(state.title_template.as_str(), "{title} — My Site");
        assert_eq!(state.favicon.as_deref(), Some("https://site.test/favicon.ico"));

        let snapshot = state.snapshot.unwrap();
        assert_eq!(snapshot.content, "<p>Our team writes Rust.</p>");
        assert_eq!(snapshot.locale, "de_DE");

        assert_eq!(state.seo.score, Some(72.0));
        assert_eq!(state.seo.results.good.len(), 1);
        assert_eq!(state.seo.results.ok.len(), 1);
        assert_eq!(state.readability.results.bad.len(), 1);
        assert_eq!(state.all_results.len(), 3);
        assert_eq!(state.analyzed_document, Some(DocumentId(PAGE.to_string())));
    }

    #[tokio::test]
    async fn test_paper_carries_page_and_editor_values() {
        let mut config = config();
        config.focus_keyword = Some("rust".to_string());
        config.is_cornerstone = true;
        let f = fixture_with(config, FakeSource::with_preview(&page_html("Team")));
        f.panel.start().await.unwrap();

        let paper = f.engine.papers.lock().unwrap()[0].clone();
        assert_eq!(paper.focus_keyword, "rust");
        assert_eq!(paper.title, "Team");
        assert_eq!(paper.description, "Who we are");
        assert_eq!(paper.url, "/about/team");
        assert_eq!(paper.locale, "de_DE");
        assert!(paper.title_render_width > 0.0);
        let configs = f.engine.configs.lock().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].locale, "de_DE");
        assert!(configs[0].use_heavy_analysis_variant);
    }

    #[tokio::test]
    async fn test_seo_filter_hides_results() {
        let mut config = config();
        config.seo_result_filter = vec!["metaDescriptionKeyword".to_string()];
        let f = fixture_with(config, FakeSource::with_preview(&page_html("Team")));
        f.panel.start().await.unwrap();

        let state = f.panel.state();
        assert!(state.seo.results.ok.is_empty());
        assert_eq!(state.seo.results.good.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_halts_cycle() {
        let f = fixture_with(config(), Arc::new(FakeSource::default()));
        let result = f.panel.start().await;
        assert!(matches!(result, Err(PanelError::Fetch(_))));

        let state = f.panel.state();
        assert!(state.error.unwrap().contains("500"));
        assert!(!state.is_loading);
        assert!(!state.is_analyzing);
        assert!(state.snapshot.is_none());
        assert_eq!(f.engine.analyses(), 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_halts_cycle() {
        let mut config = config();
        config.content_selector = "#missing".to_string();
        let f = fixture_with(config, FakeSource::with_preview(&page_html("Team")));

        let result = f.panel.load_page_content().await;
        assert!(matches!(result, Err(PanelError::Extraction(_))));
        assert!(f.panel.state().error.is_some());
        assert_eq!(f.engine.analyses(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_error_bucket() {
        let f = fixture();
        f.engine.fail.store(true, Ordering::SeqCst);
        f.panel.start().await.unwrap();

        let state = f.panel.state();
        assert_eq!(state.error, None);
        assert!(!state.is_analyzing);
        for summary in [&state.seo, &state.readability] {
            assert_eq!(summary.results.len(), 1);
            assert_eq!(summary.results.error[0].text, ENGINE_ERROR_TEXT);
        }
    }

    #[tokio::test]
    async fn test_template_is_derived_once() {
        let f = fixture();
        f.panel.start().await.unwrap();

        f.source.set_body(PREVIEW, &page_html("Something else entirely"));
        f.panel.load_page_content().await.unwrap();
        assert_eq!(f.panel.state().title_template.as_str(), "{title} — My Site");

        f.panel
            .update_editor_data(EditorField::Title, "New Home".to_string());
        assert_eq!(f.panel.rendered_title(), "New Home — My Site");
        assert_eq!(f.panel.snippet_preview().title, "New Home — My Site");
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_coalesce_into_one_write_and_one_fetch() {
        let f = fixture();
        f.panel.start().await.unwrap();
        assert_eq!(f.source.fetches(), 1);

        f.panel
            .update_editor_data(EditorField::FocusKeyword, "ru".to_string());
        tokio::time::sleep(Duration::from_millis(100)).await;
        f.panel
            .update_editor_data(EditorField::FocusKeyword, "rust".to_string());
        assert_eq!(f.panel.state().editor.focus_keyword, "rust");

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(f.host.writes(), 1);
        assert_eq!(f.host.property_html("focusKeyword").as_deref(), Some("rust"));
        assert_eq!(f.source.fetches(), 1);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(f.source.fetches(), 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(f.source.fetches(), 2);
        let papers = f.engine.papers.lock().unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].focus_keyword, "rust");
    }

    #[tokio::test]
    async fn test_stale_analysis_is_discarded() {
        let f = fixture();
        let gate = Arc::new(Notify::new());
        *f.engine.gate.lock().unwrap() = Some(gate.clone());

        let load = {
            let panel = f.panel.clone();
            tokio::spawn(async move { panel.load_page_content().await })
        };
        while f.engine.analyses() == 0 {
            tokio::task::yield_now().await;
        }

        let next = DocumentId("/sites/site/contact".to_string());
        f.panel.switch_document(next.clone(), contact_config()).await;
        gate.notify_one();
        load.await.unwrap().unwrap();

        let state = f.panel.state();
        assert_eq!(state.document, next);
        assert_eq!(state.analyzed_document, None);
        assert!(state.seo.results.is_empty());
        assert!(state.all_results.is_empty());
        assert!(!state.first_load_complete);
    }

    #[tokio::test]
    async fn test_stale_preview_is_discarded() {
        let f = fixture();
        let gate = Arc::new(Notify::new());
        *f.source.gate.lock().unwrap() = Some(gate.clone());

        let load = {
            let panel = f.panel.clone();
            tokio::spawn(async move { panel.load_page_content().await })
        };
        while f.source.fetches() == 0 {
            tokio::task::yield_now().await;
        }

        f.panel
            .switch_document(DocumentId("/sites/site/contact".to_string()), contact_config())
            .await;
        gate.notify_one();
        load.await.unwrap().unwrap();

        let state = f.panel.state();
        assert!(state.snapshot.is_none());
        assert_eq!(state.title_template, TitleTemplate::identity());
        assert_eq!(f.engine.analyses(), 0);
    }

    #[tokio::test]
    async fn test_switch_document_starts_fresh() {
        let f = fixture();
        f.panel.start().await.unwrap();

        let next = DocumentId("/sites/site/contact".to_string());
        f.source.set_body(CONTACT_PREVIEW, &page_html("Contact | My Site"));
        f.panel.switch_document(next.clone(), contact_config()).await;
        assert_eq!(f.panel.state().editor.title, "Contact");
        assert_eq!(f.panel.state().editor.url, CONTACT_PAGE);
        f.panel.load_page_content().await.unwrap();

        assert!(f.source.fetched().contains(&CONTACT_PREVIEW.to_string()));
        let state = f.panel.state();
        assert_eq!(state.title_template.as_str(), "{title} | My Site");
        assert_eq!(state.analyzed_document, Some(next));
        assert_eq!(f.panel.config().page_url, CONTACT_PAGE);
        assert_eq!(f.panel.snippet_preview().url, CONTACT_PAGE);

        let paper = f.engine.papers.lock().unwrap().last().cloned().unwrap();
        assert_eq!(paper.url, "/contact");
        assert_eq!(paper.title, "Contact | My Site");
    }

    #[tokio::test]
    async fn test_refresh_during_load_is_served_afterwards() {
        let f = fixture();
        let gate = Arc::new(Notify::new());
        *f.source.gate.lock().unwrap() = Some(gate.clone());

        let load = {
            let panel = f.panel.clone();
            tokio::spawn(async move { panel.load_page_content().await })
        };
        while f.source.fetches() == 0 {
            tokio::task::yield_now().await;
        }

        // Returns at once; the outstanding load picks it up
        f.panel.load_page_content().await.unwrap();
        assert_eq!(f.source.fetches(), 1);

        f.source.set_body(PREVIEW, &page_html("Edited | My Site"));
        *f.source.gate.lock().unwrap() = None;
        gate.notify_one();
        load.await.unwrap().unwrap();

        assert_eq!(f.source.fetches(), 2);
        let papers = f.engine.papers.lock().unwrap();
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[1].title, "Edited | My Site");
        assert_eq!(
            f.panel.state().snapshot.unwrap().title,
            "Edited | My Site"
        );
    }

    #[tokio::test]
    async fn test_resources_come_from_their_own_source() {
        let source = FakeSource::with_preview(&page_html("Home Page — My Site"));
        let resources = Arc::new(FakeSource::default());
        resources.set_body("https://site.test/favicon.ico", "icon");
        let mut config = config();
        config.translations_url = Some(TRANSLATIONS.to_string());
        let f = fixture_with_resources(config, source.clone(), resources.clone());
        f.panel.start().await.unwrap();

        assert_eq!(
            f.panel.state().favicon.as_deref(),
            Some("https://site.test/favicon.ico")
        );
        assert_eq!(source.fetched(), [PREVIEW]);
        assert!(resources.fetched().contains(&TRANSLATIONS.to_string()));
        assert!(resources.fetched().contains(&"https://site.test/favicon.ico".to_string()));
    }

    #[tokio::test]
    async fn test_unavailable_translations_fall_back_to_empty_bundle() {
        let mut config = config();
        config.translations_url = Some(TRANSLATIONS.to_string());
        let f = fixture_with(config, FakeSource::with_preview(&page_html("Team")));
        f.panel.start().await.unwrap();

        let configs = f.engine.configs.lock().unwrap();
        assert_eq!(configs[0].translations, Translations::empty());
        assert_eq!(f.engine.analyses(), 1);
    }

    #[tokio::test]
    async fn test_loaded_translations_reach_the_engine() {
        let bundle = r#"{
            "domain": "js-text-analysis",
            "locale_data": {"js-text-analysis": {"": {"lang": "de"}, "Good": ["Gut"]}}
        }"#;
        let mut config = config();
        config.translations_url = Some(TRANSLATIONS.to_string());
        let source = FakeSource::with_preview(&page_html("Team"));
        source.set_body(TRANSLATIONS, bundle);
        let f = fixture_with(config, source);
        f.panel.start().await.unwrap();

        let configs = f.engine.configs.lock().unwrap();
        assert_eq!(configs[0].translations, Translations::from_json(bundle).unwrap());
        assert_ne!(configs[0].translations, Translations::empty());
    }

    #[tokio::test]
    async fn test_malformed_translations_fall_back_to_empty_bundle() {
        let mut config = config();
        config.translations_url = Some(TRANSLATIONS.to_string());
        let source = FakeSource::with_preview(&page_html("Team"));
        source.set_body(TRANSLATIONS, r#"{"error": "not found"}"#);
        let f = fixture_with(config, source);
        f.panel.start().await.unwrap();

        assert_eq!(
            f.engine.configs.lock().unwrap()[0].translations,
            Translations::empty()
        );
    }

    #[tokio::test]
    async fn test_homepage_snippet_uses_base_url() {
        let mut config = config();
        config.is_homepage = true;
        config.base_url = "https://site.test/".to_string();
        let f = fixture_with(config, FakeSource::with_preview(&page_html("Home")));
        assert_eq!(f.panel.snippet_preview().url, "https://site.test/");
    }
}
