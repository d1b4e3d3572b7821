//! Remote fixture service client.
//!
//! Expects two JSON endpoints:
//! - `GET {base_url}/assessments` returning a list of `AssessmentInfo`
//! - `GET {base_url}/assessments/{id}` returning a full `Assessment`

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use reqwest::Url;
use serde::Deserialize;
use tracing::instrument;

use gradup_core::model::{Assessment, AssessmentInfo};
use gradup_core::traits::AssessmentSource;

use crate::error::FixtureError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Assessment source backed by an HTTP fixture service.
pub struct HttpSource {
    base_url: Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpSource {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid base URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("base URL cannot carry a path: {base_url}");
        }

        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str], missing: &str) -> Result<T> {
        let mut request = self.client.get(self.endpoint(segments)?);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FixtureError::Network(format!("request timed out after {DEFAULT_TIMEOUT_SECS}s"))
            } else {
                FixtureError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(FixtureError::NotFound(missing.to_string()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(FixtureError::Api { status, message }.into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| FixtureError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| FixtureError::Malformed(e.to_string()).into())
    }
}

#[async_trait]
impl AssessmentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_assessments(&self) -> Result<Vec<AssessmentInfo>> {
        self.get_json(&["assessments"], "assessment listing").await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_assessment(&self, id: &str) -> Result<Assessment> {
        let assessment: Assessment = self.get_json(&["assessments", id], id).await?;
        tracing::debug!(questions = assessment.question_count(), "assessment received");
        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradup_core::model::{Category, Difficulty, Phase, Question, QuestionContent, Section};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote_assessment() -> Assessment {
        Assessment {
            id: "remote-1".into(),
            title: "Remote".into(),
            description: String::new(),
            duration_minutes: 20,
            difficulty: Difficulty::Hard,
            phases: vec![Phase {
                index: 0,
                label: "Day 1".into(),
                description: String::new(),
                guidelines: vec![],
                sections: vec![Section {
                    label: "Psychometric".into(),
                    category: Category::Psychometric,
                    questions: vec![Question {
                        id: "psy-1".into(),
                        category: Category::Psychometric,
                        skill: None,
                        difficulty: Difficulty::Medium,
                        content: QuestionContent::FreeText {
                            prompt: "Describe yourself.".into(),
                        },
                    }],
                }],
            }],
        }
    }

    #[tokio::test]
    async fn fetches_assessment_with_bearer_key() {
        let server = MockServer::start().await;
        let body = serde_json::to_value(remote_assessment()).unwrap();

        Mock::given(method("GET"))
            .and(path("/assessments/remote-1"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), Some("secret".into())).unwrap();
        let assessment = source.fetch_assessment("remote-1").await.unwrap();

        assert_eq!(assessment.title, "Remote");
        assert_eq!(assessment.question_count(), 1);
        assert!(matches!(
            assessment.find_question("psy-1").unwrap().content,
            QuestionContent::FreeText { .. }
        ));
    }

    #[tokio::test]
    async fn lists_assessments() {
        let server = MockServer::start().await;
        let body = serde_json::to_value(vec![remote_assessment().info()]).unwrap();

        Mock::given(method("GET"))
            .and(path("/assessments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let source = HttpSource::new(&format!("{}/", server.uri()), None).unwrap();
        let infos = source.list_assessments().await.unwrap();
        assert_eq!(infos, vec![remote_assessment().info()]);
    }

    #[tokio::test]
    async fn not_found_maps_to_fixture_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assessments/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None).unwrap();
        let err = source.fetch_assessment("missing").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FixtureError>(),
            Some(FixtureError::NotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn server_error_carries_message() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assessments/remote-1"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({"message": "fixtures warming up"})),
            )
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None).unwrap();
        let err = source.fetch_assessment("remote-1").await.unwrap_err();
        match err.downcast_ref::<FixtureError>() {
            Some(FixtureError::Api { status, message }) => {
                assert_eq!(*status, 503);
                assert_eq!(message, "fixtures warming up");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ids_are_escaped_as_one_path_segment() {
        let source = HttpSource::new("https://fixtures.example.com/api/", None).unwrap();
        let url = source.endpoint(&["assessments", "drive/2026?x#y"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://fixtures.example.com/api/assessments/drive%2F2026%3Fx%23y"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpSource::new("not a url", None).is_err());
        assert!(HttpSource::new("mailto:ops@example.com", None).is_err());
    }

    #[tokio::test]
    async fn malformed_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/assessments/remote-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": 7}"))
            .mount(&server)
            .await;

        let source = HttpSource::new(&server.uri(), None).unwrap();
        let err = source.fetch_assessment("remote-1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FixtureError>(),
            Some(FixtureError::Malformed(_))
        ));
    }
}
