use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::classifier::{ClassifierLoader, HttpClassifierLoader, LesionClassifier};
use crate::models::ModelSource;

/// Failures while bringing the classifier resource up.
///
/// `Configuration` is detected before any network access and stays until the
/// configuration changes; everything else is retryable by calling `load()`
/// again. Variants own their message text so one outcome can fan out to every
/// caller attached to an in-flight load.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("classifier source not configured: {0}")]
    Configuration(String),
    #[error("failed to fetch {asset}: {message}")]
    Fetch { asset: &'static str, message: String },
    #[error("{asset} hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        asset: &'static str,
        expected: String,
        actual: String,
    },
    #[error("malformed model metadata: {0}")]
    Metadata(String),
    #[error("failed to initialize classifier session: {0}")]
    Session(String),
    #[error("i/o error while caching {asset}: {message}")]
    Io { asset: &'static str, message: String },
    #[error("classifier load interrupted: {0}")]
    Interrupted(String),
}

impl LoadError {
    pub(crate) fn fetch(asset: &'static str, err: reqwest::Error) -> Self {
        Self::Fetch {
            asset,
            message: err.to_string(),
        }
    }

    pub(crate) fn io(asset: &'static str, err: io::Error) -> Self {
        Self::Io {
            asset,
            message: err.to_string(),
        }
    }

    /// True when retrying is pointless until the configuration changes.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

type LoadOutcome = Result<(), LoadError>;
type OutcomeReceiver = watch::Receiver<Option<LoadOutcome>>;

enum LifecycleState {
    Unloaded,
    Loading,
    Ready(Arc<dyn LesionClassifier>),
    Failed,
}

struct Inner {
    state: LifecycleState,
    last_error: Option<String>,
    /// Bumped by `dispose()`; a load started under an older epoch may finish
    /// but cannot commit its resource.
    epoch: u64,
    inflight: Option<OutcomeReceiver>,
}

struct Shared {
    source: ModelSource,
    loader: Arc<dyn ClassifierLoader>,
    inner: Mutex<Inner>,
}

/// Owns the single classifier resource and guards its lifecycle:
/// `Unloaded -> Loading -> Ready | Failed`, back to `Unloaded` via
/// [`dispose`](Self::dispose).
///
/// `load()` is idempotent once `Ready` and single-flight while `Loading`:
/// concurrent callers attach to the in-flight fetch and all observe its
/// outcome; only one fetch ever runs at a time. The resource itself is
/// reachable solely through [`classifier`](Self::classifier), so nothing
/// outside this type can outlive or mutate the lifecycle.
///
/// Cloning is cheap and shares the same underlying resource.
#[derive(Clone)]
pub struct ModelLifecycleManager {
    shared: Arc<Shared>,
}

impl ModelLifecycleManager {
    /// Creates a manager fetching assets over HTTP into the default cache.
    pub fn new(source: ModelSource) -> io::Result<Self> {
        let loader = HttpClassifierLoader::new_default()?;
        Ok(Self::with_loader(source, Arc::new(loader)))
    }

    /// Creates a manager with a custom loader (used by tests to avoid the
    /// network entirely).
    pub fn with_loader(source: ModelSource, loader: Arc<dyn ClassifierLoader>) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                loader,
                inner: Mutex::new(Inner {
                    state: LifecycleState::Unloaded,
                    last_error: None,
                    epoch: 0,
                    inflight: None,
                }),
            }),
        }
    }

    /// Brings the classifier up, at most one fetch at a time.
    ///
    /// Already `Ready`: returns immediately without touching the resource.
    /// `Loading`: attaches to the in-flight fetch and returns its outcome.
    /// `Unloaded`/`Failed`: validates the configured source (failing fast
    /// before any network access), then starts the two-stage fetch.
    pub async fn load(&self) -> Result<(), LoadError> {
        let rx = {
            let mut inner = lock(&self.shared.inner);
            match &inner.state {
                LifecycleState::Ready(_) => {
                    log::debug!("classifier already loaded, skipping");
                    return Ok(());
                }
                LifecycleState::Loading => match inner.inflight.clone() {
                    Some(rx) => {
                        log::debug!("classifier load already in flight, attaching");
                        rx
                    }
                    // Loading with no registration cannot normally happen;
                    // recover by starting a fresh load.
                    None => self.register_load(&mut inner),
                },
                LifecycleState::Unloaded | LifecycleState::Failed => {
                    if let Err(err) = validate_source(&self.shared.source) {
                        inner.state = LifecycleState::Failed;
                        inner.last_error = Some(err.to_string());
                        log::error!("{err}");
                        return Err(err);
                    }
                    self.register_load(&mut inner)
                }
            }
        };

        await_outcome(rx).await
    }

    /// Registers an in-flight load and spawns the fetch. Runs on its own task
    /// so attached waiters resolve even if the initiating caller goes away.
    fn register_load(&self, inner: &mut Inner) -> OutcomeReceiver {
        let (tx, rx) = watch::channel(None);
        inner.state = LifecycleState::Loading;
        inner.inflight = Some(rx.clone());
        let epoch = inner.epoch;

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            log::info!("loading classifier from {}", shared.source.base_url);
            let result = shared.loader.load(&shared.source).await;

            let outcome = {
                let mut inner = lock(&shared.inner);
                let current = inner.epoch == epoch;
                let outcome = match result {
                    Ok(classifier) => {
                        if current {
                            inner.state = LifecycleState::Ready(classifier);
                            inner.last_error = None;
                            log::info!("classifier ready");
                        } else {
                            log::info!("classifier load finished after dispose; discarding resource");
                        }
                        Ok(())
                    }
                    Err(err) => {
                        if current {
                            inner.state = LifecycleState::Failed;
                            inner.last_error = Some(err.to_string());
                            log::error!("classifier load failed: {err}");
                        }
                        Err(err)
                    }
                };
                if current {
                    inner.inflight = None;
                }
                outcome
            };

            let _ = tx.send(Some(outcome));
        });

        rx
    }

    /// Non-blocking readiness probe.
    pub fn is_ready(&self) -> bool {
        matches!(lock(&self.shared.inner).state, LifecycleState::Ready(_))
    }

    /// The diagnostic recorded by the most recent failed load, kept until the
    /// next successful load or `dispose()`.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.shared.inner).last_error.clone()
    }

    /// The loaded resource, if `Ready`. Sole read access to the classifier.
    pub fn classifier(&self) -> Option<Arc<dyn LesionClassifier>> {
        match &lock(&self.shared.inner).state {
            LifecycleState::Ready(classifier) => Some(Arc::clone(classifier)),
            _ => None,
        }
    }

    /// Releases the resource and returns to `Unloaded`.
    ///
    /// Clears the cached diagnostic and invalidates any in-flight load: its
    /// waiters still receive that attempt's outcome, but the resource is
    /// discarded and a subsequent `load()` starts fresh. Safe to call from
    /// any state.
    pub fn dispose(&self) {
        let mut inner = lock(&self.shared.inner);
        if matches!(inner.state, LifecycleState::Loading) {
            log::info!("disposing while a load is in flight; registration invalidated");
        }
        inner.epoch = inner.epoch.wrapping_add(1);
        inner.state = LifecycleState::Unloaded;
        inner.last_error = None;
        inner.inflight = None;
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn await_outcome(mut rx: OutcomeReceiver) -> LoadOutcome {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            return Err(LoadError::Interrupted(
                "load task dropped before completing".to_string(),
            ));
        }
    }
}

fn validate_source(source: &ModelSource) -> Result<(), LoadError> {
    let base = source.base_url.trim();
    if base.is_empty() {
        return Err(LoadError::Configuration(
            "model base URL is empty; set DERMASCAN_MODEL_URL to your training \
             export location (the directory serving model.onnx and metadata.json)"
                .to_string(),
        ));
    }
    if base.contains("[...]") || base.contains("YOUR_MODEL") {
        return Err(LoadError::Configuration(format!(
            "model base URL still contains a placeholder ({base}); replace it with \
             your training export URL or set DERMASCAN_MODEL_URL"
        )));
    }
    Ok(())
}
