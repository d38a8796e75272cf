use std::{collections::HashMap, fmt, sync::Arc};

use indicatif::ProgressBar;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    debug,
    matcher::{self, MatchError, Matcher},
    service::{self, ServiceError, TrackSearch},
    types::{MatchResult, ServiceTrack},
    warning,
};

#[derive(Debug)]
pub enum TrackError {
    InvalidInput(MatchError),
    Upstream(ServiceError),
    /// The task resolving the track panicked or was cancelled.
    Aborted(String),
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackError::InvalidInput(e) => write!(f, "{}", e),
            TrackError::Upstream(e) => write!(f, "{}", e),
            TrackError::Aborted(msg) => write!(f, "search task failed: {}", msg),
        }
    }
}

impl std::error::Error for TrackError {}

impl From<MatchError> for TrackError {
    fn from(err: MatchError) -> Self {
        TrackError::InvalidInput(err)
    }
}

impl From<ServiceError> for TrackError {
    fn from(err: ServiceError) -> Self {
        TrackError::Upstream(err)
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub result: MatchResult,
    /// The search result the match points at.
    pub matched: Option<ServiceTrack>,
}

#[derive(Debug)]
pub struct TrackOutcome {
    /// Zero-based position in the source playlist.
    pub position: usize,
    pub source: ServiceTrack,
    pub result: Result<Resolution, TrackError>,
}

impl TrackOutcome {
    pub fn matched(&self) -> Option<&ServiceTrack> {
        self.result.as_ref().ok().and_then(|r| r.matched.as_ref())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    pub matcher: Matcher,
    pub concurrency: usize,
    /// Append "explicit" to queries for explicit source tracks.
    pub explicit_queries: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            matcher: Matcher::default(),
            concurrency: 4,
            explicit_queries: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub matched: usize,
    pub unmatched: usize,
    pub failed: usize,
}

pub fn summarize(outcomes: &[TrackOutcome]) -> Summary {
    outcomes
        .iter()
        .fold(Summary::default(), |mut summary, outcome| {
            match &outcome.result {
                Ok(r) if r.result.is_matched() => summary.matched += 1,
                Ok(_) => summary.unmatched += 1,
                Err(_) => summary.failed += 1,
            }
            summary
        })
}

/// Searches and matches a single source track.
pub async fn resolve_one<S: TrackSearch>(
    search: &S,
    matcher: &Matcher,
    track: &ServiceTrack,
    explicit_queries: bool,
) -> Result<Resolution, TrackError> {
    matcher::validate(&track.descriptor)?;

    let query = service::search_query(&track.descriptor, explicit_queries && track.is_explicit());
    debug!("searching for: {}", query);

    let candidates = search.search(&query).await?;
    let descriptors: Vec<_> = candidates.iter().map(|c| c.descriptor.clone()).collect();
    let result = matcher.match_track(&track.descriptor, &descriptors)?;

    let matched = result.index().and_then(|i| candidates.into_iter().nth(i));
    Ok(Resolution { result, matched })
}

/// Resolves every track of a playlist against `search`.
///
/// Tracks are searched concurrently, at most `options.concurrency` at a time.
/// A failing track only fails its own outcome. The returned outcomes are in
/// source order regardless of completion order.
pub async fn resolve_tracks<S>(
    tracks: Vec<ServiceTrack>,
    search: Arc<S>,
    options: ResolveOptions,
    progress: ProgressBar,
) -> Vec<TrackOutcome>
where
    S: TrackSearch + Send + Sync + 'static,
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut set = JoinSet::new();
    // source of each running task, so a task that dies still yields an outcome
    let mut pending = HashMap::with_capacity(tracks.len());

    for (position, track) in tracks.into_iter().enumerate() {
        let search = Arc::clone(&search);
        let semaphore = Arc::clone(&semaphore);
        let progress = progress.clone();
        let source = track.clone();

        let handle = set.spawn(async move {
            // the semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            let result = resolve_one(
                search.as_ref(),
                &options.matcher,
                &track,
                options.explicit_queries,
            )
            .await;
            progress.inc(1);

            TrackOutcome {
                position,
                source: track,
                result,
            }
        });
        pending.insert(handle.id(), (position, source));
    }

    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                pending.remove(&id);
                outcomes.push(outcome);
            }
            Err(e) => {
                warning!("Task join error: {}", e);
                if let Some((position, source)) = pending.remove(&e.id()) {
                    progress.inc(1);
                    outcomes.push(TrackOutcome {
                        position,
                        source,
                        result: Err(TrackError::Aborted(e.to_string())),
                    });
                }
            }
        }
    }

    outcomes.sort_by_key(|o| o.position);
    outcomes
}
