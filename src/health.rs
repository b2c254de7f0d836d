//! Static health reporting.
//!
//! The report never probes dependencies: the service has none, so it is healthy whenever it
//! can answer.

use serde::{Deserialize, Serialize};

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// Application version from `APP_VERSION`.
    pub version: String,
    /// Deployment environment from `ENVIRONMENT`.
    pub environment: String,
}

/// Produces [`HealthResponse`] values from the configured version and environment.
#[derive(Debug, Clone)]
pub struct HealthReport {
    version: String,
    environment: String,
}

impl HealthReport {
    /// Build a reporter for the given version and environment name.
    pub fn new(version: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            environment: environment.into(),
        }
    }

    /// Current health status.
    pub fn report(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            version: self.version.clone(),
            environment: self.environment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_configured_values() {
        let report = HealthReport::new("2.0.1", "production").report();
        assert_eq!(report.status, "healthy");
        assert_eq!(report.version, "2.0.1");
        assert_eq!(report.environment, "production");
    }
}
