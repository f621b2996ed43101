//! Collaborator contracts consumed by the dashboard: auth, health metrics,
//! and goals.
//!
//! The layout engine never implements these; it only reads from them. Each
//! boundary is an object-safe async trait so the UI layer can inject real
//! platform adapters while tests and the developer binary use the in-memory
//! stubs below.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metrics the dashboard widgets render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Steps,
    SleepHours,
    HeartRateVariability,
    Hydration,
    MindfulMinutes,
}

/// Readiness of the device health platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Loading,
    WaitingForPermission,
    Ready,
    Error,
    Empty,
}

/// Point-in-time numeric metric values. Absent entries mean the platform has
/// no sample for that metric yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub values: HashMap<MetricKind, f64>,
}

impl MetricsSnapshot {
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub identity: UserIdentity,
    pub timezone: String,
    pub avatar_url: Option<String>,
}

/// Authentication boundary: a nullable current user plus profile lookup.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn current_user(&self) -> Option<UserIdentity>;
    async fn user_profile(&self, user_id: &str) -> Option<UserProfile>;
}

/// Device health-data boundary.
#[async_trait]
pub trait HealthDataSource: Send + Sync {
    async fn snapshot(&self) -> MetricsSnapshot;
    fn status(&self) -> SourceStatus;
}

/// Per-metric numeric targets.
#[async_trait]
pub trait GoalsStore: Send + Sync {
    async fn goal(&self, kind: MetricKind) -> Option<f64>;
}

/// Signed-out stub; `user_profile` knows nobody.
#[derive(Default)]
pub struct StubAuthService {
    user: Option<UserProfile>,
}

impl StubAuthService {
    pub fn signed_in(profile: UserProfile) -> Self {
        Self {
            user: Some(profile),
        }
    }
}

#[async_trait]
impl AuthService for StubAuthService {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.user.as_ref().map(|p| p.identity.clone())
    }

    async fn user_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.user
            .as_ref()
            .filter(|p| p.identity.id == user_id)
            .cloned()
    }
}

/// Fixed-snapshot health source for tests and previews.
pub struct StaticHealthSource {
    snapshot: MetricsSnapshot,
    status: SourceStatus,
}

impl StaticHealthSource {
    pub fn new(snapshot: MetricsSnapshot, status: SourceStatus) -> Self {
        Self { snapshot, status }
    }

    pub fn empty() -> Self {
        Self::new(MetricsSnapshot::default(), SourceStatus::Empty)
    }
}

#[async_trait]
impl HealthDataSource for StaticHealthSource {
    async fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot.clone()
    }

    fn status(&self) -> SourceStatus {
        self.status
    }
}

/// Mutable in-memory goals map.
#[derive(Default)]
pub struct StaticGoals {
    goals: Mutex<HashMap<MetricKind, f64>>,
}

impl StaticGoals {
    pub fn set(&self, kind: MetricKind, target: f64) {
        self.goals
            .lock()
            .expect("goals map poisoned")
            .insert(kind, target);
    }
}

#[async_trait]
impl GoalsStore for StaticGoals {
    async fn goal(&self, kind: MetricKind) -> Option<f64> {
        self.goals
            .lock()
            .expect("goals map poisoned")
            .get(&kind)
            .copied()
    }
}
