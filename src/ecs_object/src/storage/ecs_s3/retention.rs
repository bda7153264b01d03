//! Retention awareness.
//!
//! An object written with a retention period or policy cannot be updated,
//! appended to or deleted until the retention window elapses. The window is
//! measured by the service clock; the client never predicts expiry and never
//! waits for it. A mutation inside the window fails with
//! [`ObjectError::ObjectUnderRetention`](super::error::ObjectError::ObjectUnderRetention),
//! whatever HTTP status the service chose for it.

use std::time::Duration;

/// Header carrying a retention period in whole seconds.
pub const RETENTION_PERIOD_HEADER: &str = "x-emc-retention-period";

/// Header naming a retention policy defined on the service.
pub const RETENTION_POLICY_HEADER: &str = "x-emc-retention-policy";

/// Service error code for a mutation inside an active retention window.
pub const OBJECT_UNDER_RETENTION_CODE: &str = "ObjectUnderRetention";

/// Retention applied to a newly written object.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Retention {
    /// Fixed duration from the time of the write. Sub-second parts are dropped.
    Period(Duration),
    /// Named policy whose duration is defined by the service.
    Policy(String),
}

impl Retention {
    pub fn period_secs(secs: u64) -> Self {
        Retention::Period(Duration::from_secs(secs))
    }

    pub fn policy(name: impl Into<String>) -> Self {
        Retention::Policy(name.into())
    }

    pub(crate) fn header(&self) -> (&'static str, String) {
        match self {
            Retention::Period(period) => (RETENTION_PERIOD_HEADER, period.as_secs().to_string()),
            Retention::Policy(name) => (RETENTION_POLICY_HEADER, name.clone()),
        }
    }
}

/// Whether a service error code reports an active retention window.
pub fn is_retention_violation(code: Option<&str>) -> bool {
    code.is_some_and(|c| c == OBJECT_UNDER_RETENTION_CODE)
}
