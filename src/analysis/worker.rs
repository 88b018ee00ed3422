use crate::analysis::session::{AnalysisEngine, EngineFactory};
use crate::analysis::{EngineConfig, EngineResponse, Paper};
use crate::error::EngineError;
use async_trait::async_trait;
use std::sync::Arc;
use std::thread;
use tokio::sync::{mpsc, oneshot};

/// A synchronous scorer, run on its own thread by [`WorkerEngine`]
pub trait Scorer: Send {
    fn configure(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    fn score(&mut self, paper: &Paper) -> Result<EngineResponse, EngineError>;
}

enum Request {
    Initialize(EngineConfig, oneshot::Sender<Result<(), EngineError>>),
    Analyze(Paper, oneshot::Sender<Result<EngineResponse, EngineError>>),
}

/// Engine handle backed by a dedicated worker thread.
///
/// Requests travel over a channel and are answered one at a time, in order. The
/// worker stops once the handle is dropped.
pub struct WorkerEngine {
    requests: mpsc::Sender<Request>,
}

impl WorkerEngine {
    pub fn spawn(scorer: Box<dyn Scorer>) -> Result<Self, EngineError> {
        let (requests, inbox) = mpsc::channel(8);
        thread::Builder::new()
            .name("analysis-worker".to_string())
            .spawn(move || worker_loop(scorer, inbox))
            .map_err(|e| EngineError::Construction(e.to_string()))?;
        Ok(Self { requests })
    }

    async fn call<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> Request,
    ) -> Result<T, EngineError> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(request(reply))
            .await
            .map_err(|_| EngineError::Transport("worker stopped".to_string()))?;
        answer
            .await
            .map_err(|_| EngineError::Transport("worker dropped the request".to_string()))?
    }
}

fn worker_loop(mut scorer: Box<dyn Scorer>, mut inbox: mpsc::Receiver<Request>) {
    let mut configured = false;
    while let Some(request) = inbox.blocking_recv() {
        match request {
            Request::Initialize(config, reply) => {
                let result = scorer.configure(&config);
                configured |= result.is_ok();
                let _ = reply.send(result);
            }
            Request::Analyze(paper, reply) => {
                let result = if configured {
                    scorer.score(&paper)
                } else {
                    Err(EngineError::Uninitialized)
                };
                let _ = reply.send(result);
            }
        }
    }
    ::log::debug!("Analysis worker stopped");
}

#[async_trait]
impl AnalysisEngine for WorkerEngine {
    async fn initialize(&self, config: &EngineConfig) -> Result<(), EngineError> {
        let config = config.clone();
        self.call(move |reply| Request::Initialize(config, reply)).await
    }

    async fn analyze(&self, paper: &Paper) -> Result<EngineResponse, EngineError> {
        let paper = paper.clone();
        self.call(move |reply| Request::Analyze(paper, reply)).await
    }
}

type MakeScorer = dyn Fn() -> Result<Box<dyn Scorer>, EngineError> + Send + Sync;

/// Spawns a fresh worker, with a scorer from `make`, for every engine handle
pub struct WorkerEngineFactory {
    make: Box<MakeScorer>,
}

impl WorkerEngineFactory {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Scorer>, EngineError> + Send + Sync + 'static,
    {
        Self {
            make: Box::new(make),
        }
    }
}

impl EngineFactory for WorkerEngineFactory {
    fn create(&self) -> Result<Arc<dyn AnalysisEngine>, EngineError> {
        let scorer = (self.make)()?;
        Ok(Arc::new(WorkerEngine::spawn(scorer)?))
    }
}
