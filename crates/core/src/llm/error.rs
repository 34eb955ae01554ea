use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

/// Failure from a rationale provider, carrying what the provider returned so
/// the caller can log or store it next to the fallback text.
#[derive(Debug, Clone)]
pub struct RationaleError {
    pub provider: Provider,
    pub stage: &'static str,
    /// HTTP status of a non-success response.
    pub status: Option<u16>,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for RationaleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rationale error (provider={}, stage={}): {}",
            self.provider.as_str(),
            self.stage,
            self.detail
        )
    }
}

impl std::error::Error for RationaleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_provider_and_stage() {
        let err = RationaleError {
            provider: Provider::Anthropic,
            stage: "http",
            status: Some(529),
            detail: "status=529".to_string(),
            raw_output: None,
            raw_response_json: None,
        };
        assert_eq!(
            err.to_string(),
            "rationale error (provider=anthropic, stage=http): status=529"
        );

        let any: anyhow::Error = err.into();
        assert!(any.downcast_ref::<RationaleError>().is_some());
    }
}
