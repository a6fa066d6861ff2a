//! Single-flight cache for expiring credentials.

use std::fmt::{self, Debug};
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::TimeDelta;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use log::{debug, warn};

use crate::time::{now, DateTime};
use crate::{Context, Error, ProvideCredential, Result, SigningCredential};

/// Credentials expiring within this window are refreshed in the background.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(300);

type RefreshTask<K> = Shared<BoxFuture<'static, Result<Option<K>>>>;

enum State<K> {
    Empty,
    Pending(RefreshTask<K>),
    Cached {
        value: K,
        expires_at: DateTime,
    },
    Refreshing {
        value: K,
        expires_at: DateTime,
        task: RefreshTask<K>,
    },
    Failed(Error),
}

impl<K> Default for State<K> {
    fn default() -> Self {
        State::Empty
    }
}

impl<K> State<K> {
    fn name(&self) -> &'static str {
        match self {
            State::Empty => "empty",
            State::Pending(_) => "pending",
            State::Cached { .. } => "cached",
            State::Refreshing { .. } => "refreshing",
            State::Failed(_) => "failed",
        }
    }
}

/// CredentialCache keeps the credential of a provider and refreshes it before it expires.
///
/// - At most one call to the provider is in flight. Concurrent callers that
///   need a fresh value all wait on that call and observe the same result.
/// - A value expiring within the refresh threshold is still returned
///   immediately while a background refresh runs.
/// - An expired value is never returned; callers wait for the refresh.
/// - Values without expiration are cached forever.
///
/// Refreshes run as spawned tasks, so dropping a waiting caller never cancels
/// the refresh for the others.
pub struct CredentialCache<P: ProvideCredential> {
    inner: Arc<Inner<P>>,
}

struct Inner<P: ProvideCredential> {
    provider: P,
    threshold: TimeDelta,
    state: Mutex<State<P::Credential>>,
}

impl<P: ProvideCredential> Clone for CredentialCache<P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: ProvideCredential> Debug for CredentialCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock().expect("lock poisoned");
        f.debug_struct("CredentialCache")
            .field("provider", &self.inner.provider)
            .field("threshold", &self.inner.threshold)
            .field("state", &state.name())
            .finish()
    }
}

impl<P> CredentialCache<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    /// Create a cache with [`DEFAULT_REFRESH_THRESHOLD`].
    pub fn new(provider: P) -> Self {
        Self::with_threshold(provider, DEFAULT_REFRESH_THRESHOLD)
    }

    /// Create a cache with a custom refresh threshold.
    pub fn with_threshold(provider: P, threshold: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                threshold: TimeDelta::from_std(threshold)
                    .unwrap_or_else(|_| TimeDelta::weeks(52 * 100)),
                state: Mutex::new(State::Empty),
            }),
        }
    }

    /// Get the credential, fetching it with `ctx` when missing or expired.
    pub async fn get(&self, ctx: &Context) -> Result<Option<P::Credential>> {
        let task = {
            let mut state = self.inner.state.lock().expect("lock poisoned");
            let now = now();
            let fresh_until = now
                .checked_add_signed(self.inner.threshold)
                .unwrap_or(DateTime::MAX_UTC);

            match mem::take(&mut *state) {
                State::Cached { value, expires_at } if expires_at > fresh_until => {
                    *state = State::Cached {
                        value: value.clone(),
                        expires_at,
                    };
                    return Ok(Some(value));
                }
                State::Cached { value, expires_at } if expires_at > now => {
                    debug!("credential expires at {expires_at}, refreshing in background");
                    let task = self.spawn_refresh(ctx);
                    *state = State::Refreshing {
                        value: value.clone(),
                        expires_at,
                        task,
                    };
                    return Ok(Some(value));
                }
                State::Refreshing {
                    value,
                    expires_at,
                    task,
                } if expires_at > now => {
                    *state = State::Refreshing {
                        value: value.clone(),
                        expires_at,
                        task,
                    };
                    return Ok(Some(value));
                }
                // The cached value expired while the refresh is still running.
                State::Refreshing { task, .. } | State::Pending(task) => {
                    *state = State::Pending(task.clone());
                    task
                }
                State::Empty | State::Cached { .. } | State::Failed(_) => {
                    debug!("credential missing or expired, refreshing");
                    let task = self.spawn_refresh(ctx);
                    *state = State::Pending(task.clone());
                    task
                }
            }
        };

        task.await
    }

    /// Must be called with the state lock held so the task can't finish
    /// before it is stored.
    fn spawn_refresh(&self, ctx: &Context) -> RefreshTask<P::Credential> {
        let inner = self.inner.clone();
        let ctx = ctx.clone();
        let handle = tokio::spawn(async move {
            let result = inner.provider.provide_credential(&ctx).await;
            inner.complete(&result);
            result
        });

        let inner = self.inner.clone();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let err = Error::credential_fetch("credential refresh task aborted")
                        .with_source(e);
                    inner.complete(&Err(err.clone()));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl<P> Inner<P>
where
    P: ProvideCredential,
    P::Credential: SigningCredential,
{
    fn complete(&self, result: &Result<Option<P::Credential>>) {
        let mut state = self.state.lock().expect("lock poisoned");
        match result {
            Ok(Some(cred)) => {
                let expires_at = cred.expires_at().unwrap_or(DateTime::MAX_UTC);
                debug!("credential refreshed, expires at {expires_at}");
                *state = State::Cached {
                    value: cred.clone(),
                    expires_at,
                };
            }
            Ok(None) => {
                debug!("credential provider returned nothing");
                *state = State::Empty;
            }
            Err(err) => match mem::take(&mut *state) {
                State::Refreshing {
                    value, expires_at, ..
                } => {
                    warn!("background credential refresh failed, keep using cached one: {err}");
                    *state = State::Cached { value, expires_at };
                }
                _ => {
                    warn!("credential refresh failed: {err}");
                    *state = State::Failed(err.clone());
                }
            },
        }
    }
}
