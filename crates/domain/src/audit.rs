use chrono::{DateTime, Utc};
use common::Version;
use serde::{Deserialize, Serialize};

/// Bookkeeping columns every persisted row carries.
///
/// Only the store writes these; domain mutators never touch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Audit {
    pub version: Version,
    pub created_date: Option<DateTime<Utc>>,
    pub update_date: Option<DateTime<Utc>>,
}

impl Audit {
    /// Audit columns of a row inserted at `now`.
    pub fn inserted(now: DateTime<Utc>) -> Self {
        Self {
            version: Version::initial(),
            created_date: Some(now),
            update_date: Some(now),
        }
    }

    /// Audit columns after a successful update of a row previously at `self`.
    pub fn updated(&self, now: DateTime<Utc>) -> Self {
        Self {
            version: self.version.next(),
            created_date: self.created_date,
            update_date: Some(now),
        }
    }
}
