//! Role credential cache

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use fleetlink_core::GetFleetRoleCredentialsResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cached credentials are reused only while they outlive this window
pub const RENEWAL_WINDOW_MINUTES: i64 = 15;

/// Longest role session name the credential authority accepts
pub const MAX_ROLE_SESSION_NAME_LEN: usize = 64;

/// Credentials keyed by role ARN, plus the "not managed" sentinel
#[derive(Default)]
pub(crate) struct CredentialCache {
    entries: DashMap<String, GetFleetRoleCredentialsResult>,
    /// One fetch at a time per role ARN
    fetches: DashMap<String, Arc<Mutex<()>>>,
    not_managed: AtomicBool,
}

impl CredentialCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn renewal_window() -> Duration {
        Duration::minutes(RENEWAL_WINDOW_MINUTES)
    }

    pub(crate) fn get_fresh(&self, role_arn: &str) -> Option<GetFleetRoleCredentialsResult> {
        self.get_fresh_at(role_arn, Utc::now())
    }

    /// Cached credentials for `role_arn` if still valid beyond the renewal
    /// window at `now`; a stale entry is evicted
    pub(crate) fn get_fresh_at(
        &self,
        role_arn: &str,
        now: DateTime<Utc>,
    ) -> Option<GetFleetRoleCredentialsResult> {
        let window = Self::renewal_window();
        {
            let entry = self.entries.get(role_arn)?;
            if entry.is_valid_beyond(window, now) {
                return Some(entry.clone());
            }
        }

        // Only evict if no fresh entry replaced it meanwhile.
        self.entries
            .remove_if(role_arn, |_, cached| !cached.is_valid_beyond(window, now));
        None
    }

    /// Lock to hold while fetching credentials for `role_arn`
    pub(crate) fn fetch_lock(&self, role_arn: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.fetches.entry(role_arn.to_string()).or_default())
    }

    pub(crate) fn insert(&self, role_arn: &str, credentials: GetFleetRoleCredentialsResult) {
        self.entries.insert(role_arn.to_string(), credentials);
    }

    pub(crate) fn mark_not_managed(&self) {
        self.not_managed.store(true, Ordering::Release);
        self.entries.clear();
    }

    pub(crate) fn is_not_managed(&self) -> bool {
        self.not_managed.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// `fleetId-hostId`, cut to the length the credential authority accepts
pub(crate) fn default_session_name(fleet_id: &str, host_id: &str) -> String {
    format!("{fleet_id}-{host_id}")
        .chars()
        .take(MAX_ROLE_SESSION_NAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(expiration: DateTime<Utc>) -> GetFleetRoleCredentialsResult {
        GetFleetRoleCredentialsResult {
            access_key_id: "AKIA".into(),
            secret_access_key: "secret".into(),
            session_token: "token".into(),
            expiration: Some(expiration),
            ..GetFleetRoleCredentialsResult::default()
        }
    }

    #[test]
    fn test_fetch_lock_is_shared_per_role() {
        let cache = CredentialCache::new();
        let first = cache.fetch_lock("arn:role");

        assert!(Arc::ptr_eq(&first, &cache.fetch_lock("arn:role")));
        assert!(!Arc::ptr_eq(&first, &cache.fetch_lock("arn:other")));
    }

    #[test]
    fn test_fresh_entry_is_reused() {
        let cache = CredentialCache::new();
        let now = Utc::now();
        cache.insert("arn:role", credentials(now + Duration::hours(1)));

        assert!(cache.get_fresh_at("arn:role", now).is_some());
        assert!(cache.get_fresh_at("arn:role", now + Duration::minutes(44)).is_some());
        assert!(cache.get_fresh_at("arn:other", now).is_none());
    }

    #[test]
    fn test_entry_inside_renewal_window_is_evicted() {
        let cache = CredentialCache::new();
        let now = Utc::now();
        cache.insert("arn:role", credentials(now + Duration::hours(1)));

        assert!(cache.get_fresh_at("arn:role", now + Duration::minutes(46)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_missing_expiration_is_never_fresh() {
        let cache = CredentialCache::new();
        cache.insert(
            "arn:role",
            GetFleetRoleCredentialsResult {
                access_key_id: "AKIA".into(),
                ..GetFleetRoleCredentialsResult::default()
            },
        );
        assert!(cache.get_fresh("arn:role").is_none());
    }

    #[test]
    fn test_not_managed_sentinel() {
        let cache = CredentialCache::new();
        cache.insert("arn:role", credentials(Utc::now() + Duration::hours(1)));
        assert!(!cache.is_not_managed());

        cache.mark_not_managed();

        assert!(cache.is_not_managed());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_default_session_name_is_truncated() {
        assert_eq!(default_session_name("fleet-1", "host-1"), "fleet-1-host-1");

        let long = default_session_name(&"f".repeat(40), &"h".repeat(40));
        assert_eq!(long.len(), MAX_ROLE_SESSION_NAME_LEN);
        assert!(long.starts_with(&"f".repeat(40)));
    }
}
