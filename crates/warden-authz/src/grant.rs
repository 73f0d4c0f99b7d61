use crate::{Capability, PrincipalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A capability issued to one principal outside of its role.
///
/// # Invariants
/// - `expires_at == None` means the grant never expires.
/// - A grant is active at `now` only while `expires_at > now`; a grant whose
///   expiry equals `now` is already inactive.
///
/// # Example
/// ```rust
/// use chrono::{Duration, Utc};
/// use warden_authz::{Capability, Grant};
///
/// let now = Utc::now();
/// let grant = Grant::new("u-1".into(), Capability::ViewUsers, "admin-1".into(), now)
///     .expiring_at(now + Duration::hours(1));
/// assert!(grant.is_active_at(now));
/// assert!(!grant.is_active_at(now + Duration::hours(1)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub principal_id: PrincipalId,
    pub capability: Capability,
    pub granted_by: PrincipalId,
    pub granted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Grant {
    /// Non-expiring grant.
    pub fn new(
        principal_id: PrincipalId,
        capability: Capability,
        granted_by: PrincipalId,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            principal_id,
            capability,
            granted_by,
            granted_at,
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).single().expect("valid time")
    }

    fn grant(expires_at: Option<DateTime<Utc>>) -> Grant {
        let mut grant = Grant::new(
            "u-1".into(),
            Capability::DeleteUsers,
            "root".into(),
            fixed_now() - Duration::days(2),
        );
        grant.expires_at = expires_at;
        grant
    }

    #[test]
    fn non_expiring_grant_is_always_active() {
        let grant = grant(None);
        assert!(grant.is_active_at(fixed_now()));
        assert!(grant.is_active_at(fixed_now() + Duration::days(3650)));
    }

    #[test]
    fn grant_expired_yesterday_is_inactive() {
        let grant = grant(Some(fixed_now() - Duration::days(1)));
        assert!(!grant.is_active_at(fixed_now()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let grant = grant(Some(fixed_now()));
        assert!(!grant.is_active_at(fixed_now()));
        assert!(grant.is_active_at(fixed_now() - Duration::milliseconds(1)));
    }

    #[test]
    fn serde_omits_absent_expiry() {
        let json = serde_json::to_value(grant(None)).expect("serialize");
        assert!(json.get("expires_at").is_none());
        assert_eq!(json["capability"], "DELETE_USERS");

        let parsed: Grant = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.expires_at, None);
    }
}
