//! Level-synchronous breadth-first accumulation.
//!
//! Each wave fetches every not-yet-visited reference of the frontier on a
//! bounded pool of workers. Workers write only their own result slot; the
//! graph is updated in a single-threaded merge once the whole wave has
//! joined. The first failing fetch cancels the rest of the wave and the run.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tg_core::{FetchError, Issue, IssueHandle, IssueRef, TaskGraph, TaskGraphErrorCode};
use tg_parser::extract_references;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info};

use crate::{IssueFetcher, Logger};

/// Upper bound on simultaneously in-flight fetches.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulateConfig {
    pub max_in_flight: usize,
    /// Record closed items as nodes but do not follow their references.
    pub skip_closed: bool,
}

impl Default for AccumulateConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            skip_closed: false,
        }
    }
}

impl AccumulateConfig {
    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    #[must_use]
    pub fn with_skip_closed(mut self, skip_closed: bool) -> Self {
        self.skip_closed = skip_closed;
        self
    }
}

#[derive(Debug, Error)]
pub enum AccumulateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("fetch worker failed: {0}")]
    Worker(String),
}

impl AccumulateError {
    #[must_use]
    pub const fn code(&self) -> TaskGraphErrorCode {
        TaskGraphErrorCode::Fetch
    }

    /// The reference whose fetch failed, when known.
    #[must_use]
    pub fn reference(&self) -> Option<&IssueRef> {
        match self {
            Self::Fetch(err) => Some(&err.reference),
            Self::Worker(_) => None,
        }
    }
}

/// One fetched item and the references found in it.
#[derive(Debug)]
struct Visit {
    reference: IssueRef,
    issue: Issue,
    children: Vec<IssueRef>,
}

pub struct Accumulator {
    fetcher: Arc<dyn IssueFetcher>,
    config: AccumulateConfig,
    logger: Logger,
}

impl Accumulator {
    #[must_use]
    pub fn new(fetcher: Arc<dyn IssueFetcher>) -> Self {
        Self {
            fetcher,
            config: AccumulateConfig::default(),
            logger: Logger::discard(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: AccumulateConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Discover every item reachable from `roots` and return the graph.
    ///
    /// Fails with the first fetch error; no partial graph is returned.
    pub async fn accumulate(&self, roots: &[IssueRef]) -> Result<TaskGraph, AccumulateError> {
        let mut graph = TaskGraph::new();
        let mut frontier = roots.to_vec();
        let mut wave_number = 0_usize;

        while !frontier.is_empty() {
            let wave = unvisited(&graph, frontier);
            if wave.is_empty() {
                break;
            }
            wave_number += 1;
            self.logger
                .scope(|| debug!("wave {wave_number}: fetching {} issues", wave.len()));

            let visits = self.fetch_wave(wave).await?;
            frontier = self.logger.scope(|| merge(&mut graph, visits));
        }

        self.logger.scope(|| {
            info!(
                "accumulated {} issues and {} edges in {wave_number} waves",
                graph.node_count(),
                graph.edge_count()
            );
        });
        Ok(graph)
    }

    async fn fetch_wave(&self, wave: Vec<IssueRef>) -> Result<Vec<Visit>, AccumulateError> {
        let cancel = CancellationToken::new();
        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut slots: Vec<Option<Visit>> = std::iter::repeat_with(|| None).take(wave.len()).collect();
        let mut workers = JoinSet::new();

        for (slot, reference) in wave.into_iter().enumerate() {
            let worker = Worker {
                fetcher: Arc::clone(&self.fetcher),
                permits: Arc::clone(&permits),
                cancel: cancel.clone(),
                skip_closed: self.config.skip_closed,
            };
            workers.spawn(
                async move { (slot, worker.run(reference).await) }
                    .with_subscriber(self.logger.dispatch().clone()),
            );
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            let outcome = match joined {
                Ok((slot, Ok(visit))) => {
                    if let (Some(visit), Some(entry)) = (visit, slots.get_mut(slot)) {
                        *entry = Some(visit);
                    }
                    continue;
                }
                Ok((_, Err(err))) => AccumulateError::Fetch(err),
                Err(err) => AccumulateError::Worker(err.to_string()),
            };
            if first_error.is_none() {
                cancel.cancel();
                first_error = Some(outcome);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(slots.into_iter().flatten().collect()),
        }
    }
}

struct Worker {
    fetcher: Arc<dyn IssueFetcher>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
    skip_closed: bool,
}

impl Worker {
    /// `Ok(None)` when the wave was cancelled before this fetch finished.
    async fn run(self, reference: IssueRef) -> Result<Option<Visit>, FetchError> {
        let _permit = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(None),
            permit = Arc::clone(&self.permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return Ok(None),
            },
        };

        debug!("traversing into {reference}");
        let issue = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(None),
            fetched = self.fetcher.fetch(&reference) => fetched?,
        };

        let children = if self.skip_closed && issue.state.is_closed() {
            debug!("not expanding closed issue {reference}");
            Vec::new()
        } else if issue.body.is_empty() {
            debug!("empty body for {reference}");
            Vec::new()
        } else {
            extract_references(&issue.body, &reference)
        };

        Ok(Some(Visit {
            reference,
            issue,
            children,
        }))
    }
}

/// Frontier entries not yet in the graph, first occurrence wins.
fn unvisited(graph: &TaskGraph, frontier: Vec<IssueRef>) -> Vec<IssueRef> {
    let mut queued = HashSet::new();
    frontier
        .into_iter()
        .filter(|reference| {
            let identity = reference.identity();
            !graph.contains(&identity) && queued.insert(identity)
        })
        .collect()
}

/// Record a wave's visits and return the next frontier.
fn merge(graph: &mut TaskGraph, visits: Vec<Visit>) -> Vec<IssueRef> {
    let mut next = Vec::new();
    for visit in visits {
        let identity = visit.reference.identity();
        let mut seen = HashSet::new();
        let edges: Vec<String> = visit
            .children
            .iter()
            .map(IssueRef::identity)
            .filter(|target| seen.insert(target.clone()))
            .collect();
        debug!("{identity} -> {edges:?}");

        next.extend(visit.children);
        graph.edges.insert(identity.clone(), edges);
        graph.nodes.insert(
            identity,
            IssueHandle {
                reference: visit.reference,
                issue: visit.issue,
            },
        );
    }
    next
}
