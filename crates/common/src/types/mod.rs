use serde::{Deserialize, Serialize};

/// Body of the liveness and readiness checks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Health {
    pub status: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    pub fn with_status(status: &'static str) -> Self {
        Self { status }
    }
}
