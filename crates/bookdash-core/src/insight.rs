//! Narrative insight generation
//!
//! Turns a numeric estimate into prose advice by submitting a deterministic
//! prompt to the generation service. Model identifiers are tried in the
//! configured order; the first success wins, and exhausting the chain
//! produces an `InsightResult { generated: false }` with a neutral message
//! rather than an error. Nothing escapes this boundary into the caller's
//! happy path.
//!
//! The component is a pure consumer: it never mutates the estimate or the
//! dataset, and generated text is never cached, so identical inputs may
//! produce different prose on repeated calls.

use tracing::{debug, warn};

use crate::ai::{GenBackend, GenClient};
use crate::config::ChainConfig;
use crate::models::{Estimate, EstimateRequest, InsightResult, KpiSummary};

/// Message shown when every configured model failed
pub const UNAVAILABLE_MESSAGE: &str =
    "Insight unavailable right now. The numeric estimate is still valid.";

/// Insight generator over a configured model fallback chain
pub struct InsightGenerator {
    client: GenClient,
    chain: ChainConfig,
}

impl InsightGenerator {
    pub fn new(client: GenClient, chain: ChainConfig) -> Self {
        Self { client, chain }
    }

    /// Generate prose advice for an estimate.
    ///
    /// Never fails: the terminal state of the fallback chain is an
    /// `InsightResult` with `generated: false`.
    pub async fn generate(
        &self,
        estimate: &Estimate,
        request: &EstimateRequest,
        kpis: Option<&KpiSummary>,
    ) -> InsightResult {
        let prompt = build_prompt(estimate, request, kpis);

        for model_id in &self.chain.models {
            match self
                .client
                .generate(model_id, &prompt, &self.chain.options)
                .await
            {
                Ok(narrative) => {
                    debug!(model = %model_id, "Insight generated");
                    return InsightResult {
                        prompt,
                        narrative,
                        generated: true,
                    };
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "Model failed, trying next in chain");
                }
            }
        }

        warn!("All configured models failed; returning unavailable insight");
        InsightResult {
            prompt,
            narrative: UNAVAILABLE_MESSAGE.to_string(),
            generated: false,
        }
    }

    /// Check if the generation service is reachable
    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    /// The configured model chain, in fallback order
    pub fn models(&self) -> &[String] {
        &self.chain.models
    }
}

/// Deterministic prompt template embedding the estimate and its inputs.
///
/// KPIs are optional context; when present they anchor the advice to the
/// historical aggregates.
pub fn build_prompt(
    estimate: &Estimate,
    request: &EstimateRequest,
    kpis: Option<&KpiSummary>,
) -> String {
    let mut prompt = format!(
        "You are a book sales analyst. A linear model trained on historical sales \
         projects gross revenue of {:.2} for a title selling {} units with an \
         average rating of {:.1} (outlook: {}).",
        estimate.point_value, request.target_units, request.target_rating,
        estimate.confidence_band,
    );

    if let Some(genre) = &request.target_genre {
        prompt.push_str(&format!(" The title is in the {} genre.", genre));
    }

    if let Some(kpis) = kpis {
        prompt.push_str(&format!(
            " For context, the historical dataset covers {} titles with total revenue \
             {:.2}, total units {} and mean rating {:.2}.",
            kpis.record_count, kpis.total_revenue, kpis.total_units, kpis.mean_rating,
        ));
    }

    prompt.push_str(
        " In two or three sentences, give practical advice on whether this projection \
         is attractive and what could improve it. Do not repeat the numbers back verbatim.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::ConfidenceBand;

    fn estimate() -> Estimate {
        Estimate {
            point_value: 7_250_000.0,
            confidence_band: ConfidenceBand::Good,
        }
    }

    fn request() -> EstimateRequest {
        EstimateRequest {
            target_units: 150,
            target_rating: 4.2,
            target_genre: Some("Fiction".to_string()),
        }
    }

    fn chain(models: &[&str]) -> ChainConfig {
        ChainConfig {
            models: models.iter().map(|m| m.to_string()).collect(),
            ..ChainConfig::default()
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(&estimate(), &request(), None);
        let b = build_prompt(&estimate(), &request(), None);
        assert_eq!(a, b);
        assert!(a.contains("7250000.00"));
        assert!(a.contains("150 units"));
        assert!(a.contains("good"));
        assert!(a.contains("Fiction"));
    }

    #[test]
    fn test_prompt_embeds_kpi_context() {
        let kpis = KpiSummary {
            total_revenue: 100.0,
            total_units: 10,
            mean_rating: 4.0,
            record_count: 3,
        };
        let prompt = build_prompt(&estimate(), &request(), Some(&kpis));
        assert!(prompt.contains("3 titles"));
        assert!(prompt.contains("mean rating 4.00"));
    }

    #[tokio::test]
    async fn test_primary_model_wins() {
        let generator = InsightGenerator::new(
            GenClient::Mock(MockBackend::new()),
            chain(&["primary", "secondary"]),
        );
        let result = generator.generate(&estimate(), &request(), None).await;
        assert!(result.generated);
        assert!(result.narrative.contains("primary"));
    }

    #[tokio::test]
    async fn test_fallback_to_secondary() {
        let generator = InsightGenerator::new(
            GenClient::Mock(MockBackend::failing(&["primary"])),
            chain(&["primary", "secondary"]),
        );
        let result = generator.generate(&estimate(), &request(), None).await;
        assert!(result.generated);
        assert!(result.narrative.contains("secondary"));
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_unavailable() {
        let generator = InsightGenerator::new(
            GenClient::Mock(MockBackend::failing(&["primary", "secondary"])),
            chain(&["primary", "secondary"]),
        );
        let result = generator.generate(&estimate(), &request(), None).await;
        assert!(!result.generated);
        assert_eq!(result.narrative, UNAVAILABLE_MESSAGE);
        // The prompt is still reported for display/debugging
        assert!(result.prompt.contains("book sales analyst"));
    }
}
