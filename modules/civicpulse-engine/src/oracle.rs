use async_trait::async_trait;

use civicpulse_common::CivicPulseError;

/// Minimum oracle confidence for an AI-gated resolution to proceed.
pub const RESOLUTION_CONFIDENCE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone)]
pub struct ConfidenceResult {
    pub confidence: f64,
    pub reasoning: String,
}

/// External image-verification oracle: given the original report photo and
/// the staff proof photo, how confident is it that the issue is gone?
/// The analysis itself is out of scope; production wires an HTTP client.
#[async_trait]
pub trait ConfidenceOracle: Send + Sync {
    async fn verify_resolution(
        &self,
        before_image_url: &str,
        proof_image_url: &str,
    ) -> Result<ConfidenceResult, CivicPulseError>;
}

/// Fixed-answer oracle for tests and local runs.
pub struct FixedOracle {
    pub confidence: f64,
    pub reasoning: String,
}

#[async_trait]
impl ConfidenceOracle for FixedOracle {
    async fn verify_resolution(
        &self,
        _before_image_url: &str,
        _proof_image_url: &str,
    ) -> Result<ConfidenceResult, CivicPulseError> {
        Ok(ConfidenceResult {
            confidence: self.confidence,
            reasoning: self.reasoning.clone(),
        })
    }
}
