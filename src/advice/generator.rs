use crate::advice::normalizer::{bullets, normalize};
use crate::advice::rules::rule_based_text;
use crate::advice::subject::SubjectCategory;
use crate::error::MonitorError;
use crate::types::pollution::AqiCategory;
use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The air-quality situation advice is requested for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceRequest {
    pub aqi: AqiCategory,
    /// Free-form group label as sent by the client, e.g. "Elderly (65+)".
    pub subject_label: String,
    /// Pollutant key to concentration (μg/m³), when known.
    pub pollutant_levels: Option<BTreeMap<String, f64>>,
}

impl AdviceRequest {
    pub fn subject(&self) -> SubjectCategory {
        SubjectCategory::from_label(&self.subject_label)
    }
}

/// Which path produced a piece of advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceSource {
    Generative,
    RuleBased,
}

/// Normalized advice with its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceText {
    pub text: String,
    pub bullets: Vec<String>,
    pub source: AdviceSource,
    /// Name of the generative backend, for generated advice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

impl AdviceText {
    fn new(text: String, source: AdviceSource, generator: Option<String>) -> Self {
        Self {
            bullets: bullets(&text),
            text,
            source,
            generator,
        }
    }
}

/// A text-generation backend. Returns raw, un-normalized advice.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &AdviceRequest) -> Result<String, MonitorError>;
}

/// Produces advice from the configured generator, falling back to the rule
/// table when there is none, when it fails or when its text normalizes to
/// nothing.
#[derive(Clone, Default)]
pub struct AdviceService {
    generator: Option<Arc<dyn AdviceGenerator>>,
}

impl AdviceService {
    pub fn new(generator: Option<Arc<dyn AdviceGenerator>>) -> Self {
        Self { generator }
    }

    pub fn rule_based() -> Self {
        Self::default()
    }

    pub async fn advise(&self, request: &AdviceRequest) -> AdviceText {
        let subject = request.subject();

        if let Some(generator) = &self.generator {
            match generator.generate(request).await {
                Ok(raw) => {
                    let text = normalize(&raw, &request.subject_label);
                    if !text.is_empty() {
                        info!(
                            "Generated advice for '{}' with {}",
                            request.subject_label,
                            generator.name()
                        );
                        return AdviceText::new(
                            text,
                            AdviceSource::Generative,
                            Some(generator.name().to_string()),
                        );
                    }
                    warn!(
                        "{} returned no usable advice for '{}', using rule-based advice",
                        generator.name(),
                        request.subject_label
                    );
                }
                Err(e) => warn!(
                    "{} failed ({}), using rule-based advice",
                    generator.name(),
                    e
                ),
            }
        }

        AdviceText::new(
            rule_based_text(request.aqi, subject),
            AdviceSource::RuleBased,
            None,
        )
    }
}

impl std::fmt::Debug for AdviceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceService")
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::error::{FailureKind, FetchError};

    struct Canned(Result<&'static str, ()>);

    #[async_trait]
    impl AdviceGenerator for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, _request: &AdviceRequest) -> Result<String, MonitorError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(()) => Err(FetchError::AllCredentialsExhausted {
                    provider: "canned".into(),
                    attempted: 2,
                    last_error: FailureKind::RateLimited,
                }
                .into()),
            }
        }
    }

    fn request(label: &str) -> AdviceRequest {
        AdviceRequest {
            aqi: AqiCategory::Moderate,
            subject_label: label.to_string(),
            pollutant_levels: Some(BTreeMap::from([("pm2_5".to_string(), 35.5)])),
        }
    }

    #[tokio::test]
    async fn test_generated_text_is_normalized() {
        let service = AdviceService::new(Some(Arc::new(Canned(Ok(
            "Here are some tips:\n1. Children: \"Play indoors\"\n2. Keep an inhaler nearby",
        )))));
        let advice = service.advise(&request("Children")).await;
        assert_eq!(advice.source, AdviceSource::Generative);
        assert_eq!(advice.generator.as_deref(), Some("canned"));
        assert_eq!(advice.bullets, ["Play indoors", "Keep an inhaler nearby"]);
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_rules() {
        let service = AdviceService::new(Some(Arc::new(Canned(Err(())))));
        let advice = service.advise(&request("Outdoor Workers")).await;
        assert_eq!(advice.source, AdviceSource::RuleBased);
        assert_eq!(
            advice.text,
            rule_based_text(AqiCategory::Moderate, SubjectCategory::OutdoorWorkers)
        );
    }

    #[tokio::test]
    async fn test_empty_generation_falls_back_to_rules() {
        let service = AdviceService::new(Some(Arc::new(Canned(Ok("Note:\n\n- \"\"")))));
        let advice = service.advise(&request("Children")).await;
        assert_eq!(advice.source, AdviceSource::RuleBased);
    }

    #[tokio::test]
    async fn test_without_generator_uses_rules() {
        let advice = AdviceService::rule_based().advise(&request("unknown group")).await;
        assert_eq!(advice.source, AdviceSource::RuleBased);
        assert!(advice.generator.is_none());
        assert_eq!(advice.bullets.len(), 2);
    }
}
