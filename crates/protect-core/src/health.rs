//! Process health snapshot.

use crate::clock::SharedClock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(rename = "time")]
    pub now: DateTime<Utc>,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    pub version: String,
}

/// Reports start time, current time and version. Holds no state beyond what
/// the server was constructed with.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    version: String,
    start_time: DateTime<Utc>,
    clock: SharedClock,
}

impl HealthReporter {
    #[must_use]
    pub fn new(version: impl Into<String>, start_time: DateTime<Utc>, clock: SharedClock) -> Self {
        Self { version: version.into(), start_time, clock }
    }

    #[must_use]
    pub fn report(&self) -> HealthReport {
        HealthReport {
            now: self.clock.now(),
            start_time: self.start_time,
            version: self.version.clone(),
        }
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}
