//! Benchmark orchestration
//!
//! A run moves through three phases:
//!
//! ```text
//! Loading ──► Running ──► Done
//! ```
//!
//! Loading reads the query and ground-truth files completely before any
//! database work starts. Running resolves index tables once, then builds,
//! executes and scores every query. Any failure ends the run; nothing is
//! retried or skipped.
//!
//! With `run.concurrency > 1` queries are spread over a pool of workers, each
//! on its own connection. Query `i` is always scored against ground-truth
//! record `i`, and all scoring happens on the runner's task.
//!
//! Connections are closed when a run finishes. On a pool failure the workers
//! are aborted mid-query instead, and their connections are dropped without
//! `close()`. The sequential path closes its connection on failure too.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use vecprobe_engine::config::{BenchConfig, DatasetConfig};
use vecprobe_engine::vecs::{self, IndexVector, Vector};
use vecprobe_engine::{BenchError, QueryBuilder, RunSummary, RunningStats};

pub mod executor;

pub use executor::{QueryExecutor, QueryResult};

use crate::client::{catalog, ConnectionProvider, SqlConnection};
use crate::metrics::ProgressSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Running,
    Done,
}

/// Query vectors paired by position with their ground-truth ids.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub queries: Vec<Vector>,
    pub ground_truth: Vec<IndexVector>,
}

impl Dataset {
    /// Checks the pairing: at least one query, one uniform dimension, and a
    /// ground-truth record for every query. Extra ground truth is ignored.
    pub fn new(
        queries: Vec<Vector>,
        ground_truth: Vec<IndexVector>,
    ) -> vecprobe_engine::Result<Self> {
        if queries.is_empty() {
            return Err(BenchError::config("query set is empty"));
        }
        if vecs::uniform_dimension(&queries).is_none() {
            return Err(BenchError::config(
                "query vectors have mixed dimensions within one run",
            ));
        }
        if ground_truth.len() < queries.len() {
            return Err(BenchError::config(format!(
                "ground truth has {} records but there are {} queries",
                ground_truth.len(),
                queries.len()
            )));
        }
        Ok(Self {
            queries,
            ground_truth,
        })
    }

    /// Read both files, whole or over the configured 1-based range.
    pub fn load(config: &DatasetConfig) -> vecprobe_engine::Result<Self> {
        let (queries, ground_truth) = if config.is_ranged() {
            let first = config.first.unwrap_or(1);
            (
                vecs::read_range::<f32>(&config.query_file, first, config.last)?,
                vecs::read_range::<i32>(&config.ground_truth_file, first, config.last)?,
            )
        } else {
            (
                vecs::read_fvecs(&config.query_file)?,
                vecs::read_ivecs(&config.ground_truth_file)?,
            )
        };

        tracing::info!(
            queries = queries.len(),
            ground_truth = ground_truth.len(),
            dim = vecs::uniform_dimension(&queries).unwrap_or(0),
            "dataset loaded"
        );
        Self::new(queries, ground_truth)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

pub struct BenchmarkRunner {
    config: BenchConfig,
    provider: Arc<dyn ConnectionProvider>,
    progress: Box<dyn ProgressSink>,
    phase: Phase,
}

impl BenchmarkRunner {
    pub fn new(
        config: BenchConfig,
        provider: Arc<dyn ConnectionProvider>,
        progress: Box<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            provider,
            progress,
            phase: Phase::Loading,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Load the configured files and run every query.
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.phase = Phase::Loading;
        let dataset = Dataset::load(&self.config.dataset).context("failed to load dataset")?;
        self.run_dataset(dataset).await
    }

    /// Run every query of an already loaded dataset.
    pub async fn run_dataset(&mut self, dataset: Dataset) -> Result<RunSummary> {
        self.phase = Phase::Running;
        let backend = self.config.connection.backend;
        let database = self.config.query.database.clone();
        tracing::info!(
            scenario = %self.config.scenario_name(),
            queries = dataset.len(),
            concurrency = self.config.run.concurrency,
            "starting benchmark"
        );

        let mut conn = self
            .provider
            .connect(backend, &database)
            .await
            .with_context(|| format!("failed to connect to {backend} database '{database}'"))?;

        let outcome = self.drive(conn.as_mut(), dataset).await;
        if let Err(e) = conn.close().await {
            tracing::warn!(error = %e, "failed to close connection");
        }
        let summary = outcome?;

        self.phase = Phase::Done;
        Ok(summary)
    }

    async fn drive(
        &mut self,
        conn: &mut dyn SqlConnection,
        dataset: Dataset,
    ) -> Result<RunSummary> {
        let backend = self.config.connection.backend;
        let index = catalog::resolve_index(conn, &self.config.query)
            .await
            .context("failed to resolve index tables")?;
        let builder = Arc::new(QueryBuilder::new(self.config.query.clone(), backend, index)?);
        let executor = QueryExecutor::new(self.config.query.k_len());

        self.warmup(conn, &builder, &executor, &dataset.queries).await?;

        let dataset = Arc::new(dataset);
        self.progress.on_start(dataset.len());
        let stats = if self.config.run.concurrency <= 1 {
            self.run_sequential(conn, &builder, &executor, &dataset).await?
        } else {
            self.run_pool(builder, executor, Arc::clone(&dataset)).await?
        };

        let summary = stats.finalize(self.config.scenario_name());
        self.progress.on_finish(&summary);
        tracing::info!(
            queries = summary.queries,
            recall = summary.mean_recall,
            qps = summary.qps,
            wall_qps = summary.wall_qps,
            "benchmark complete"
        );
        Ok(summary)
    }

    /// Leading queries run on the main connection and are not scored.
    async fn warmup(
        &self,
        conn: &mut dyn SqlConnection,
        builder: &QueryBuilder,
        executor: &QueryExecutor,
        queries: &[Vector],
    ) -> Result<()> {
        let n = self.config.run.warmup_queries.min(queries.len());
        if n == 0 {
            return Ok(());
        }
        tracing::info!(queries = n, "warming up");
        for (i, query) in queries[..n].iter().enumerate() {
            executor
                .execute(conn, &builder.build(query))
                .await
                .with_context(|| format!("warmup query {i} failed"))?;
        }
        Ok(())
    }

    async fn run_sequential(
        &mut self,
        conn: &mut dyn SqlConnection,
        builder: &QueryBuilder,
        executor: &QueryExecutor,
        dataset: &Dataset,
    ) -> Result<RunningStats> {
        let mut stats = RunningStats::new()?;
        for (i, query) in dataset.queries.iter().enumerate() {
            let statement = builder.build(query);
            let result = match executor.execute(conn, &statement).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(query = i, error.kind = e.kind(), error = %e, "aborting run");
                    return Err(e).with_context(|| format!("query {i} failed; aborting run"));
                }
            };
            self.fold(&mut stats, dataset, i, &result);
        }
        Ok(stats)
    }

    async fn run_pool(
        &mut self,
        builder: Arc<QueryBuilder>,
        executor: QueryExecutor,
        dataset: Arc<Dataset>,
    ) -> Result<RunningStats> {
        let workers = self.config.run.concurrency.min(dataset.len());
        let backend = self.config.connection.backend;
        let next = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) =
            mpsc::channel::<vecprobe_engine::Result<(usize, QueryResult)>>(workers * 2);

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let provider = Arc::clone(&self.provider);
            let builder = Arc::clone(&builder);
            let dataset = Arc::clone(&dataset);
            let next = Arc::clone(&next);
            let tx = tx.clone();
            let database = self.config.query.database.clone();

            tasks.spawn(async move {
                let mut conn = match provider.connect(backend, &database).await {
                    Ok(conn) => conn,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= dataset.len() {
                        break;
                    }
                    let statement = builder.build(&dataset.queries[i]);
                    let outcome = executor
                        .execute(conn.as_mut(), &statement)
                        .await
                        .map(|result| (i, result));
                    let failed = outcome.is_err();
                    if tx.send(outcome).await.is_err() || failed {
                        break;
                    }
                }
                if let Err(e) = conn.close().await {
                    tracing::warn!(worker, error = %e, "failed to close worker connection");
                }
            });
        }
        drop(tx);

        let mut stats = RunningStats::new()?;
        while let Some(message) = rx.recv().await {
            match message {
                Ok((i, result)) => self.fold(&mut stats, &dataset, i, &result),
                Err(e) => {
                    tracing::error!(error.kind = e.kind(), error = %e, "aborting run");
                    tasks.abort_all();
                    return Err(e).context("query failed; aborting run");
                }
            }
        }
        while let Some(joined) = tasks.join_next().await {
            joined.context("benchmark worker panicked")?;
        }
        Ok(stats)
    }

    fn fold(
        &mut self,
        stats: &mut RunningStats,
        dataset: &Dataset,
        index: usize,
        result: &QueryResult,
    ) {
        let score = self.config.run.recall_metric.score(
            &dataset.ground_truth[index],
            &result.ids,
            self.config.query.k_len(),
        );
        stats.record(score, result.elapsed);
        self.progress.on_query(index, &stats.snapshot());
    }
}
