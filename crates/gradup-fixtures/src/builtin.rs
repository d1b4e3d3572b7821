//! Built-in placement simulation catalog.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use gradup_core::model::{Assessment, AssessmentInfo};
use gradup_core::parser::parse_assessment_str;
use gradup_core::traits::AssessmentSource;

use crate::error::FixtureError;

/// Simulated fetch latency of the built-in catalog.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(800);

const CATALOG: &[(&str, &str)] = &[
    (
        "placement-simulation.toml",
        include_str!("../../../assessments/placement-simulation.toml"),
    ),
    (
        "aptitude-sprint.toml",
        include_str!("../../../assessments/aptitude-sprint.toml"),
    ),
];

/// Serves a fixed set of assessments from memory after a simulated delay.
///
/// Stands in for a real fixture backend in demos and tests.
pub struct BuiltinSource {
    assessments: Vec<Assessment>,
    delay: Duration,
    /// Number of fetch and list calls made.
    call_count: AtomicU32,
}

impl BuiltinSource {
    /// The bundled GradUp catalog.
    pub fn new(delay: Duration) -> Result<Self> {
        let assessments = CATALOG
            .iter()
            .map(|(name, content)| parse_assessment_str(content, Path::new(name)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_assessments(assessments, delay))
    }

    /// A source over caller-supplied assessments.
    pub fn with_assessments(assessments: Vec<Assessment>, delay: Duration) -> Self {
        Self {
            assessments,
            delay,
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl AssessmentSource for BuiltinSource {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn list_assessments(&self) -> Result<Vec<AssessmentInfo>> {
        self.simulate_latency().await;
        Ok(self.assessments.iter().map(Assessment::info).collect())
    }

    async fn fetch_assessment(&self, id: &str) -> Result<Assessment> {
        self.simulate_latency().await;
        self.assessments
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| FixtureError::NotFound(id.to_string()).into())
    }
}
