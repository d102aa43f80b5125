//! Egress proxy selection
//!
//! Which proxy and session a fetch uses is a pure function of the proxy
//! configuration and the number of successful fetches so far.

use crate::config::{ProxyConfig, SessionPolicy};
use crate::render::EgressIdentity;

/// Picks the egress identity for the next fetch
///
/// - `stable`: the first pool entry, session 0, for the whole run
/// - `rotating`: the pointer advances every `rotate_every` successful fetches,
///   wrapping around the pool; the session number is the rotation count
///
/// With `session_suffix` on a rotating policy, the username becomes
/// `<username>-session-<n>` so each rotation gets a fresh upstream session.
///
/// Returns `None` when the pool is empty.
///
/// # Example
///
/// ```
/// use sumi_sweep::config::{ProxyConfig, ProxyEntry, SessionPolicy};
/// use sumi_sweep::crawler::select_identity;
///
/// let config = ProxyConfig {
///     pool: vec![
///         ProxyEntry { server: "http://a.test:8080".into(), username: None, password: None },
///         ProxyEntry { server: "http://b.test:8080".into(), username: None, password: None },
///     ],
///     session_policy: SessionPolicy::Rotating,
///     rotate_every: 2,
///     session_suffix: false,
/// };
/// assert_eq!(select_identity(&config, 3).unwrap().server, "http://b.test:8080");
/// ```
pub fn select_identity(config: &ProxyConfig, ok_fetches: u32) -> Option<EgressIdentity> {
    if config.pool.is_empty() {
        return None;
    }

    let (index, session) = match config.session_policy {
        SessionPolicy::Stable => (0, 0),
        SessionPolicy::Rotating => {
            let rotation = ok_fetches / config.rotate_every.max(1);
            (rotation as usize % config.pool.len(), rotation)
        }
    };

    let entry = &config.pool[index];
    let username = match (&entry.username, config.session_policy) {
        (Some(username), SessionPolicy::Rotating) if config.session_suffix => {
            Some(format!("{}-session-{}", username, session))
        }
        (username, _) => username.clone(),
    };

    Some(EgressIdentity {
        server: entry.server.clone(),
        username,
        password: entry.password.clone(),
        session,
    })
}

/// The identity currently in use by a run
#[derive(Debug, Clone, Default)]
pub struct ProxyRotationState {
    current: Option<EgressIdentity>,
}

impl ProxyRotationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&EgressIdentity> {
        self.current.as_ref()
    }

    /// Recomputes the identity; returns it if it differs from the current one
    pub fn advance(&mut self, config: &ProxyConfig, ok_fetches: u32) -> Option<EgressIdentity> {
        let next = select_identity(config, ok_fetches);
        if next == self.current {
            return None;
        }
        self.current = next.clone();
        next
    }
}
