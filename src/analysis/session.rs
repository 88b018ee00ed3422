use crate::analysis::{AnalysisOutcome, EngineConfig, EngineResponse, Paper};
use crate::error::{EngineError, SessionBusy};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Handle on the external scoring engine
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Applies `config`; may be called any number of times on the same handle
    async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Scores one content package
    async fn analyze(&self, paper: &Paper) -> Result<EngineResponse, EngineError>;
}

/// Creates engine handles
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn AnalysisEngine>, EngineError>;
}

/// Owns the engine handle of one editing session.
///
/// The handle is created on the first `initialize` and reconfigured, never recreated,
/// on every later one. At most one analysis is in flight at a time; engine failures
/// come back as [`AnalysisOutcome::engine_error`] instead of errors.
pub struct AnalysisSession {
    factory: Arc<dyn EngineFactory>,
    engine: Mutex<Option<Arc<dyn AnalysisEngine>>>,
    busy: AtomicBool,
    created: AtomicUsize,
}

/// Clears the busy flag when the analysis ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AnalysisSession {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            engine: Mutex::new(None),
            busy: AtomicBool::new(false),
            created: AtomicUsize::new(0),
        }
    }

    /// Creates the engine handle if needed and applies `config` to it
    pub async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let engine = self.handle().await?;
        engine.initialize(config).await?;
        ::log::debug!(
            "Analysis engine configured for locale {} (heavy variant: {})",
            config.locale,
            config.use_heavy_analysis_variant
        );
        Ok(())
    }

    /// Submits `paper` to the configured engine.
    ///
    /// Refused with [`SessionBusy`] while another analysis is outstanding.
    pub async fn analyze(&self, paper: &Paper) -> Result<AnalysisOutcome, SessionBusy> {
        let _busy = self.acquire()?;
        Ok(self.submit(paper).await)
    }

    /// Configures the engine and analyses `paper` as one admission-controlled cycle,
    /// so no other run can reconfigure the engine in between
    pub async fn run(
        &self,
        config: &EngineConfig,
        paper: &Paper,
    ) -> Result<AnalysisOutcome, SessionBusy> {
        let _busy = self.acquire()?;
        if let Err(e) = self.initialize(config).await {
            ::log::warn!("Analysis engine could not be initialized: {}", e);
            return Ok(AnalysisOutcome::engine_error());
        }
        Ok(self.submit(paper).await)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Number of engine handles this session created
    pub fn handles_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Drops the engine handle; the next `initialize` creates a fresh one
    pub async fn reset(&self) {
        if self.engine.lock().await.take().is_some() {
            ::log::debug!("Analysis engine handle released");
        }
    }

    fn acquire(&self) -> Result<BusyGuard<'_>, SessionBusy> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SessionBusy);
        }
        Ok(BusyGuard(&self.busy))
    }

    async fn handle(&self) -> Result<Arc<dyn AnalysisEngine>, EngineError> {
        let mut slot = self.engine.lock().await;
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }
        let engine = self.factory.create()?;
        self.created.fetch_add(1, Ordering::SeqCst);
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    async fn submit(&self, paper: &Paper) -> AnalysisOutcome {
        let engine = self.engine.lock().await.clone();
        let response = match engine {
            Some(engine) => engine.analyze(paper).await,
            None => Err(EngineError::Uninitialized),
        };

        match response {
            Ok(response) => AnalysisOutcome::from_response(&response),
            Err(e) => {
                ::log::warn!("Analysis failed: {}", e);
                AnalysisOutcome::engine_error()
            }
        }
    }
}
