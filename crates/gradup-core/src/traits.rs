//! The fixture port the attempt core depends on.
//!
//! Implemented by the `gradup-fixtures` crate. The core applies no retry,
//! timeout or cancellation to these calls.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::attempt::{Attempt, TraversalPolicy};
use crate::model::{Assessment, AssessmentInfo};

/// Supplies assessment hierarchies and listing metadata.
#[async_trait]
pub trait AssessmentSource: Send + Sync {
    /// Human-readable source name (e.g. "builtin").
    fn name(&self) -> &str;

    /// List the assessments this source can supply.
    async fn list_assessments(&self) -> Result<Vec<AssessmentInfo>>;

    /// Fetch the full hierarchy of one assessment.
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment>;
}

/// Fetch an assessment and start an attempt on it.
pub async fn start_attempt(
    source: &dyn AssessmentSource,
    assessment_id: &str,
    policy: TraversalPolicy,
) -> Result<Attempt> {
    let assessment = source
        .fetch_assessment(assessment_id)
        .await
        .with_context(|| format!("failed to fetch '{assessment_id}' from {}", source.name()))?;

    tracing::debug!(
        source = source.name(),
        assessment = %assessment.id,
        questions = assessment.question_count(),
        "assessment loaded"
    );

    Ok(Attempt::new(Arc::new(assessment.normalized()), policy)?)
}
