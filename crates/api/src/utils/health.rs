//! Health reporting for AppContext components

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of healthy components required for an overall healthy status
const HEALTHY_THRESHOLD: f64 = 0.8;

/// Overall health status of the application
///
/// # Example
/// ```
/// use chrono::Utc;
/// use loadplan_lib::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new(Utc::now())
///     .add_component(ComponentHealth::healthy("record_store"))
///     .add_component(ComponentHealth::unhealthy("remote_host", "not configured"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert!(!status.is_healthy);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub is_healthy: bool,
    /// Healthy components / total components
    pub score: f64,
    pub message: Option<String>,
    pub components: Vec<ComponentHealth>,
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    pub fn new(checked_at: DateTime<Utc>) -> Self {
        Self { is_healthy: true, score: 1.0, message: None, components: Vec::new(), checked_at }
    }

    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `is_healthy`; call after all components are in.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();
        self.score = healthy_count as f64 / self.components.len() as f64;
        self.is_healthy = self.score >= HEALTHY_THRESHOLD;
        self.message = (!self.is_healthy).then(|| {
            let failing: Vec<&str> = self
                .components
                .iter()
                .filter(|c| !c.is_healthy)
                .map(|c| c.name.as_str())
                .collect();
            format!("degraded: {}", failing.join(", "))
        });
    }
}

/// Health status of an individual component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub is_healthy: bool,
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }

    /// Healthy component carrying an informational message
    pub fn note(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
