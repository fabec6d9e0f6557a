//! Health checks
//!
//! Readiness depends on the storage root: the uploads and staging
//! directories must exist and be writable.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Overall health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthReport {
    pub fn http_status(&self) -> StatusCode {
        match self.status {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

struct CachedHealth {
    report: HealthReport,
    cached_at: Instant,
}

/// Checks the storage directories, caching the result briefly
pub struct HealthChecker {
    cache_duration: Duration,
    start_time: Instant,
    cache: RwLock<Option<CachedHealth>>,
    /// Directories that must exist and accept writes
    directories: Vec<(&'static str, PathBuf)>,
}

impl HealthChecker {
    pub fn new(cache_duration: Duration) -> Self {
        Self {
            cache_duration,
            start_time: Instant::now(),
            cache: RwLock::new(None),
            directories: Vec::new(),
        }
    }

    pub fn with_directory(mut self, name: &'static str, path: impl Into<PathBuf>) -> Self {
        self.directories.push((name, path.into()));
        self
    }

    /// Get cached health or perform checks
    pub async fn check(&self) -> HealthReport {
        {
            let cache = self.cache.read().await;
            if let Some(ref cached) = *cache {
                if cached.cached_at.elapsed() < self.cache_duration {
                    debug!("Returning cached health report");
                    return cached.report.clone();
                }
            }
        }

        let report = self.perform_checks().await;

        let mut cache = self.cache.write().await;
        *cache = Some(CachedHealth {
            report: report.clone(),
            cached_at: Instant::now(),
        });
        report
    }

    async fn perform_checks(&self) -> HealthReport {
        let mut components = Vec::with_capacity(self.directories.len());
        for (name, path) in &self.directories {
            components.push(check_directory(name, path).await);
        }

        let status = if components.iter().all(|c| c.status.is_healthy()) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        HealthReport {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now(),
        }
    }
}

async fn check_directory(name: &str, path: &Path) -> ComponentHealth {
    let start = Instant::now();

    let (status, message) = match tokio::fs::metadata(path).await {
        Ok(meta) if !meta.is_dir() => (HealthStatus::Unhealthy, "not a directory"),
        Ok(meta) if meta.permissions().readonly() => (HealthStatus::Unhealthy, "read-only"),
        Ok(_) => (HealthStatus::Healthy, "available"),
        Err(e) => {
            warn!(component = name, error = %e, "Storage directory unavailable");
            (HealthStatus::Unhealthy, "missing")
        }
    };

    ComponentHealth {
        name: name.to_string(),
        status,
        message: Some(message.to_string()),
        response_time_ms: start.elapsed().as_millis() as u64,
    }
}

/// Simple liveness check
pub async fn liveness() -> &'static str {
    "OK"
}

/// Readiness check
pub async fn readiness(
    State(health): State<Arc<HealthChecker>>,
) -> (StatusCode, Json<HealthReport>) {
    let report = health.check().await;
    (report.http_status(), Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_existing_directory_is_healthy() {
        let temp = TempDir::new().unwrap();
        let checker = HealthChecker::new(Duration::from_secs(0)).with_directory("uploads", temp.path());

        let report = checker.check().await;
        assert!(report.status.is_healthy());
        assert_eq!(report.components.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_directory_is_unhealthy() {
        let temp = TempDir::new().unwrap();
        let checker = HealthChecker::new(Duration::from_secs(0))
            .with_directory("staging", temp.path().join("nope"));

        let report = checker.check().await;
        assert_eq!(report.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_cache() {
        let checker = HealthChecker::new(Duration::from_secs(60));

        let report1 = checker.check().await;
        let report2 = checker.check().await;
        assert_eq!(report1.timestamp, report2.timestamp);
    }
}
