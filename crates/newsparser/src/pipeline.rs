// ABOUTME: Bulk processing: one tokio task per stage, bounded channels between stages, a shared error stream.
// ABOUTME: A single cancellation token aborts every stage at each receive, step or send.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ParseError, PipelineError};
use crate::registry::Registry;
use crate::resource::{FetchStage, Query, Retriever};

pub const DEFAULT_CAPACITY: usize = 16;

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch(FetchStage),
    /// Reads the body and runs the registry's extractor.
    Extract,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Fetch(s) => s.name(),
            Stage::Extract => "extract",
        }
    }
}

/// Builder and runner for the staged pipeline.
///
/// Without a registry the pipeline stops after decoder selection and emits
/// queries with open responses. With one, a final stage extracts a record.
#[derive(Debug, Clone)]
pub struct Pipeline {
    retriever: Arc<Retriever>,
    registry: Option<Arc<Registry>>,
    capacity: usize,
    cancel: CancellationToken,
}

/// Output side of a running pipeline.
#[derive(Debug)]
pub struct PipelineHandle {
    pub output: mpsc::Receiver<Query>,
    pub errors: mpsc::Receiver<PipelineError>,
    tasks: Vec<JoinHandle<()>>,
}

/// Everything a pipeline produced after it finished.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    pub queries: Vec<Query>,
    pub errors: Vec<PipelineError>,
}

impl PipelineOutcome {
    pub fn len(&self) -> usize {
        self.queries.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Pipeline {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self {
            retriever,
            registry: None,
            capacity: DEFAULT_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Bound of every inter-stage channel. Values below one are raised to one.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The stages this pipeline runs, in order.
    pub fn stages(&self) -> Vec<Stage> {
        let mut stages: Vec<Stage> = FetchStage::ALL.into_iter().map(Stage::Fetch).collect();
        if self.registry.is_some() {
            stages.push(Stage::Extract);
        }
        stages
    }

    /// Starts one task per stage fed by `input`.
    ///
    /// Must be called inside a tokio runtime. The output channel closes once
    /// the input closes and every stage drained; the error channel closes
    /// when the last stage exits.
    pub fn spawn(&self, input: mpsc::Receiver<Query>) -> PipelineHandle {
        let (err_tx, err_rx) = mpsc::channel(self.capacity);
        let mut tasks = Vec::new();
        let mut rx = input;

        for (idx, stage) in self.stages().into_iter().enumerate() {
            let (tx, next_rx) = mpsc::channel(self.capacity);
            let worker = StageWorker {
                index: idx + 1,
                stage,
                retriever: Arc::clone(&self.retriever),
                registry: self.registry.clone(),
                cancel: self.cancel.clone(),
            };
            tasks.push(tokio::spawn(worker.run(rx, tx, err_tx.clone())));
            rx = next_rx;
        }

        PipelineHandle {
            output: rx,
            errors: err_rx,
            tasks,
        }
    }

    /// Feeds `urls` with ids starting at 1 and starts the stages.
    pub fn run_urls<I>(&self, urls: I) -> PipelineHandle
    where
        I: IntoIterator<Item = String> + Send + 'static,
        I::IntoIter: Send,
    {
        let (tx, rx) = mpsc::channel(self.capacity);
        let cancel = self.cancel.clone();
        let feeder = tokio::spawn(async move {
            for (i, url) in urls.into_iter().enumerate() {
                let query = Query::with_id(i as u64 + 1, url);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    sent = tx.send(query) => if sent.is_err() { return },
                }
            }
        });

        let mut handle = self.spawn(rx);
        handle.tasks.push(feeder);
        handle
    }
}

impl PipelineHandle {
    /// Drains both streams until they close, then waits for the stage tasks.
    pub async fn collect(mut self) -> PipelineOutcome {
        let mut out = PipelineOutcome::default();
        let mut output_open = true;
        let mut errors_open = true;

        while output_open || errors_open {
            tokio::select! {
                q = self.output.recv(), if output_open => match q {
                    Some(q) => out.queries.push(q),
                    None => output_open = false,
                },
                e = self.errors.recv(), if errors_open => match e {
                    Some(e) => out.errors.push(e),
                    None => errors_open = false,
                },
            }
        }

        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "pipeline task ended abnormally");
            }
        }
        out
    }
}

struct StageWorker {
    index: usize,
    stage: Stage,
    retriever: Arc<Retriever>,
    registry: Option<Arc<Registry>>,
    cancel: CancellationToken,
}

impl StageWorker {
    async fn apply(&self, query: &mut Query) -> Result<(), ParseError> {
        match self.stage {
            Stage::Fetch(step) => self.retriever.step(step, query).await,
            Stage::Extract => match &self.registry {
                Some(registry) => registry.extract_query(query).await,
                None => Ok(()),
            },
        }
    }

    async fn run(
        self,
        mut rx: mpsc::Receiver<Query>,
        tx: mpsc::Sender<Query>,
        errors: mpsc::Sender<PipelineError>,
    ) {
        let name = self.stage.name();
        loop {
            let mut query = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                q = rx.recv() => match q {
                    Some(q) => q,
                    None => break,
                },
            };

            let applied = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                r = self.apply(&mut query) => r,
            };

            match applied {
                Ok(()) => {
                    debug!(id = query.id(), stage = name, "stage done");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        sent = tx.send(query) => if sent.is_err() { break },
                    }
                }
                Err(source) => {
                    warn!(id = query.id(), stage = name, error = %source, "query failed");
                    // The failed query and its response are dropped here.
                    let err = PipelineError {
                        id: query.id(),
                        stage: self.index,
                        stage_name: name,
                        source,
                    };
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break,
                        sent = errors.send(err) => if sent.is_err() { break },
                    }
                }
            }
        }
        debug!(stage = name, "stage closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn retriever() -> Arc<Retriever> {
        Arc::new(
            Retriever::builder()
                .test_headers()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn stage_list_depends_on_registry() {
        let p = Pipeline::new(retriever());
        assert_eq!(p.stages().len(), 4);
        let names: Vec<&str> = p
            .clone()
            .with_registry(Arc::new(Registry::new()))
            .stages()
            .into_iter()
            .map(Stage::name)
            .collect();
        assert_eq!(
            names,
            vec!["parse-url", "request", "check-status", "select-decoder", "extract"]
        );
    }

    #[tokio::test]
    async fn routes_failures_with_stage_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/ok");
            then.status(200).body("fine");
        });
        server.mock(|when, then| {
            when.method(GET).path("/gone");
            then.status(404);
        });

        let urls = vec![
            server.url("/ok"),
            "not a url".to_string(),
            server.url("/gone"),
        ];
        let outcome = Pipeline::new(retriever()).capacity(1).run_urls(urls).collect().await;
        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.queries.len(), 1);
        assert_eq!(outcome.queries[0].id(), 1);

        let mut errors: Vec<String> = outcome.errors.iter().map(|e| e.to_string()).collect();
        errors.sort();
        assert!(errors[0].starts_with("2-th query: stage 1 (parse-url): "), "{}", errors[0]);
        assert!(errors[1].starts_with("3-th query: stage 3 (check-status): "), "{}", errors[1]);
        assert!(errors[1].contains("404"));
    }

    #[tokio::test]
    async fn cancelled_pipeline_closes_without_output() {
        let token = CancellationToken::new();
        token.cancel();
        let urls: Vec<String> = (0..5).map(|i| format!("http://127.0.0.1:9/{i}")).collect();
        let outcome = Pipeline::new(retriever())
            .cancel_token(token)
            .run_urls(urls)
            .collect()
            .await;
        assert!(outcome.is_empty());
    }
}
