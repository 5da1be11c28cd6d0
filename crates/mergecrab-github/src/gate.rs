//! Token rotation gate.
//!
//! Holds a set of credentials and guarantees that API work is only attempted
//! through a credential with enough remaining quota. When the active
//! credential runs low the gate scans forward (never wrapping) for the next
//! usable one; when none is left it either refuses or sleeps until the rate
//! limit window resets, depending on the wait policy.

use crate::{
    error::{GithubError, GithubResult},
    traits::{BudgetGate, PullRequestSource, RateLimitProbe},
    types::{Credential, RateLimitInfo},
};
use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Rotates between credentials as their rate limit quota runs out
pub struct TokenGate<C> {
    credentials: Vec<Credential>,
    handles: Vec<C>,
    usable: Vec<bool>,
    reset_at: Vec<u64>,
    index: usize,
    active: C,
    allow_wait: bool,
}

impl<C> TokenGate<C>
where
    C: RateLimitProbe + Clone,
{
    /// Build one handle per credential and probe each one's quota
    ///
    /// An empty credential list falls back to a single anonymous credential.
    /// The active handle is bound to the first credential.
    ///
    /// # Errors
    /// * `GithubError::Configuration` if a handle cannot be built
    /// * `GithubError::Probe` if a credential's quota cannot be queried
    pub async fn initialize<F>(
        credentials: Vec<Credential>,
        allow_wait: bool,
        connect: F,
    ) -> GithubResult<Self>
    where
        F: Fn(&Credential) -> GithubResult<C>,
    {
        let credentials = if credentials.is_empty() {
            warn!("No credentials supplied, falling back to anonymous access");
            vec![Credential::anonymous()]
        } else {
            credentials
        };

        let handles = credentials
            .iter()
            .enumerate()
            .map(|(i, credential)| {
                connect(credential).map_err(|e| match e {
                    GithubError::Configuration(message) => GithubError::Configuration(message),
                    other => GithubError::Configuration(format!(
                        "Failed to build client for credential #{}: {}",
                        i, other
                    )),
                })
            })
            .collect::<GithubResult<Vec<C>>>()?;

        let active = handles
            .first()
            .cloned()
            .ok_or_else(|| GithubError::Configuration("No credentials available".to_string()))?;

        let mut usable = Vec::with_capacity(handles.len());
        let mut reset_at = Vec::with_capacity(handles.len());
        for (i, handle) in handles.iter().enumerate() {
            let rate = probe(i, handle).await?;
            usable.push(rate.remaining > 0);
            reset_at.push(rate.reset_at);
        }

        info!(
            "Token gate ready with {} credential(s); using credential #0 ({})",
            credentials.len(),
            credentials[0]
        );

        Ok(Self {
            credentials,
            handles,
            usable,
            reset_at,
            index: 0,
            active,
            allow_wait,
        })
    }

    /// Ensure the active credential can afford `required_requests` calls
    ///
    /// Re-probes every credential, keeps the active one if it is still
    /// usable, otherwise rotates forward to the next usable credential. With
    /// no usable credential left, returns `false` unless waiting is allowed,
    /// in which case it sleeps until the active credential's window resets
    /// and marks every credential usable again.
    pub async fn check_budget(&mut self, required_requests: u64) -> GithubResult<bool> {
        self.refresh(required_requests).await?;

        if self.usable[self.index] {
            return Ok(true);
        }

        if let Some(next) = next_usable(&self.usable, self.index) {
            self.index = next;
            self.rotate();
            info!(
                "Changing to credential #{} ({})",
                self.index, self.credentials[self.index]
            );
            return Ok(true);
        }

        if !self.allow_wait {
            warn!(
                "No credential has {} requests left and waiting is disabled",
                required_requests
            );
            return Ok(false);
        }

        let wait = self.wait_duration();
        let secs = wait.as_secs();
        warn!(
            "Rate limit exhausted on every credential; waiting {}h{}min{}s",
            secs / 3600,
            secs % 3600 / 60,
            secs % 60
        );
        tokio::time::sleep(wait).await;

        self.usable.iter_mut().for_each(|usable| *usable = true);
        Ok(true)
    }

    /// Rebind the active handle to the credential at the current index
    pub fn rotate(&mut self) {
        if let Some(handle) = self.handles.get(self.index) {
            self.active = handle.clone();
        }
    }

    /// Index of the credential the active handle is bound to
    pub fn active_index(&self) -> usize {
        self.index
    }

    /// Usability flag of every credential, as of the last probe
    pub fn usable(&self) -> &[bool] {
        &self.usable
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Handle bound to the active credential
    pub fn active(&self) -> &C {
        &self.active
    }

    async fn refresh(&mut self, required_requests: u64) -> GithubResult<()> {
        for (i, handle) in self.handles.iter().enumerate() {
            let rate = probe(i, handle).await?;
            debug!(
                "Credential #{} has {}/{} requests left",
                i, rate.remaining, rate.limit
            );
            self.usable[i] = rate.remaining > required_requests;
            self.reset_at[i] = rate.reset_at;
        }
        Ok(())
    }

    fn wait_duration(&self) -> Duration {
        let reset_at = self.reset_at.get(self.index).copied().unwrap_or(0);
        let rate = RateLimitInfo::new(0, 0, reset_at);
        Duration::from_secs(rate.seconds_until_reset_from(Utc::now().timestamp()))
    }
}

#[async_trait]
impl<C> BudgetGate for TokenGate<C>
where
    C: RateLimitProbe + PullRequestSource + Clone,
{
    type Source = C;

    async fn check_budget(&mut self, required_requests: u64) -> GithubResult<bool> {
        TokenGate::check_budget(self, required_requests).await
    }

    fn source(&self) -> &C {
        &self.active
    }
}

/// Index of the first usable credential at or after `from`
///
/// The scan never wraps around: credentials before `from` are not revisited.
///
/// # Examples
///
/// ```
/// use mergecrab_github::gate::next_usable;
///
/// assert_eq!(next_usable(&[false, false, true], 0), Some(2));
/// assert_eq!(next_usable(&[true, false, false], 1), None);
/// ```
pub fn next_usable(usable: &[bool], from: usize) -> Option<usize> {
    usable
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, usable)| **usable)
        .map(|(i, _)| i)
}

async fn probe<C: RateLimitProbe>(credential: usize, handle: &C) -> GithubResult<RateLimitInfo> {
    handle.rate_limit().await.map_err(|e| GithubError::Probe {
        credential,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::FakeGithub;
    use std::collections::HashMap;

    fn in_an_hour() -> u64 {
        (Utc::now().timestamp() + 3600) as u64
    }

    /// Build a gate over fakes keyed by token value
    async fn gate_with(
        quotas: &[(&str, u64)],
        allow_wait: bool,
    ) -> (TokenGate<FakeGithub>, HashMap<String, FakeGithub>) {
        let fakes: HashMap<String, FakeGithub> = quotas
            .iter()
            .map(|(token, remaining)| {
                (
                    token.to_string(),
                    FakeGithub::new(*remaining, in_an_hour()),
                )
            })
            .collect();
        let credentials = quotas
            .iter()
            .map(|(token, _)| Credential::from_token(*token))
            .collect();

        let lookup = fakes.clone();
        let gate = TokenGate::initialize(credentials, allow_wait, move |credential| {
            lookup
                .get(credential.token().unwrap_or_default())
                .cloned()
                .ok_or_else(|| GithubError::Configuration("unknown token".to_string()))
        })
        .await
        .unwrap();

        (gate, fakes)
    }

    #[test]
    fn test_next_usable_forward_only() {
        assert_eq!(next_usable(&[false, false, true, true], 0), Some(2));
        assert_eq!(next_usable(&[true, false, true], 1), Some(2));
        assert_eq!(next_usable(&[true, true, false], 2), None);
        assert_eq!(next_usable(&[], 0), None);
    }

    #[tokio::test]
    async fn test_initialize_binds_first_credential() {
        let (gate, _) = gate_with(&[("a", 0), ("b", 5000)], false).await;

        assert_eq!(gate.active_index(), 0);
        assert_eq!(gate.credential_count(), 2);
        assert_eq!(gate.usable(), &[false, true]);
    }

    #[tokio::test]
    async fn test_initialize_empty_falls_back_to_anonymous() {
        let fake = FakeGithub::new(60, in_an_hour());
        let gate = TokenGate::initialize(Vec::new(), false, |credential| {
            assert!(credential.is_anonymous());
            Ok(fake.clone())
        })
        .await
        .unwrap();

        assert_eq!(gate.credential_count(), 1);
        assert_eq!(gate.usable(), &[true]);
    }

    #[tokio::test]
    async fn test_initialize_connect_failure_is_configuration_error() {
        let result = TokenGate::<FakeGithub>::initialize(
            vec![Credential::from_token("a")],
            false,
            |_| Err(GithubError::ApiError("boom".to_string())),
        )
        .await;

        assert!(matches!(result, Err(GithubError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_initialize_probe_failure() {
        let fake = FakeGithub::new(5000, in_an_hour());
        fake.fail_probes(true);

        let result = TokenGate::initialize(vec![Credential::from_token("a")], false, |_| {
            Ok(fake.clone())
        })
        .await;

        assert!(matches!(
            result,
            Err(GithubError::Probe { credential: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_check_budget_keeps_active_when_quota_exceeds_request() {
        let (mut gate, _) = gate_with(&[("a", 500), ("b", 5000)], false).await;

        assert!(gate.check_budget(401).await.unwrap());
        assert_eq!(gate.active_index(), 0);
    }

    #[tokio::test]
    async fn test_check_budget_requires_strictly_more_than_request() {
        let (mut gate, _) = gate_with(&[("a", 401)], false).await;

        assert!(!gate.check_budget(401).await.unwrap());
        assert_eq!(gate.usable(), &[false]);
    }

    #[tokio::test]
    async fn test_check_budget_rotates_to_first_usable() {
        let (mut gate, _) =
            gate_with(&[("a", 10), ("b", 20), ("c", 5000), ("d", 5000)], false).await;

        assert!(gate.check_budget(401).await.unwrap());
        assert_eq!(gate.active_index(), 2);
        assert_eq!(gate.usable(), &[false, false, true, true]);
    }

    #[tokio::test]
    async fn test_active_handle_follows_rotation() {
        let (mut gate, fakes) = gate_with(&[("a", 10), ("b", 5000)], false).await;

        assert!(gate.check_budget(401).await.unwrap());
        let active_rate = gate.source().rate_limit().await.unwrap();
        let expected = fakes["b"].rate_limit().await.unwrap();
        assert_eq!(active_rate, expected);
    }

    #[tokio::test]
    async fn test_check_budget_does_not_wrap_around() {
        let (mut gate, fakes) = gate_with(&[("a", 5000), ("b", 5000)], false).await;

        fakes["a"].set_remaining(0);
        assert!(gate.check_budget(401).await.unwrap());
        assert_eq!(gate.active_index(), 1);

        // "a" recovers but sits behind the active index
        fakes["a"].set_remaining(5000);
        fakes["b"].set_remaining(0);
        assert!(!gate.check_budget(401).await.unwrap());
        assert_eq!(gate.active_index(), 1);
        assert_eq!(gate.usable(), &[true, false]);
    }

    #[tokio::test]
    async fn test_check_budget_refuses_without_wait() {
        let (mut gate, _) = gate_with(&[("a", 0), ("b", 0)], false).await;

        assert!(!gate.check_budget(1).await.unwrap());
        assert_eq!(gate.active_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_marks_everything_usable() {
        let (mut gate, _) = gate_with(&[("a", 0), ("b", 3)], true).await;

        let started = tokio::time::Instant::now();
        assert!(gate.check_budget(401).await.unwrap());

        assert_eq!(gate.usable(), &[true, true]);
        assert_eq!(gate.active_index(), 0);
        assert!(started.elapsed() >= Duration::from_secs(3500));
    }

    #[tokio::test]
    async fn test_wait_with_past_reset_returns_immediately() {
        let fake = FakeGithub::new(0, 0);
        let mut gate = TokenGate::initialize(vec![Credential::from_token("a")], true, |_| {
            Ok(fake.clone())
        })
        .await
        .unwrap();

        assert!(gate.check_budget(10).await.unwrap());
        assert_eq!(gate.usable(), &[true]);
    }

    #[tokio::test]
    async fn test_check_budget_probe_failure_propagates() {
        let (mut gate, fakes) = gate_with(&[("a", 5000), ("b", 5000)], false).await;

        fakes["b"].fail_probes(true);
        let result = gate.check_budget(1).await;

        assert!(matches!(
            result,
            Err(GithubError::Probe { credential: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_rotate_rebinds_without_touching_flags() {
        let (mut gate, _) = gate_with(&[("a", 0), ("b", 5000)], false).await;

        gate.rotate();
        assert_eq!(gate.active_index(), 0);
        assert_eq!(gate.usable(), &[false, true]);
    }
}
