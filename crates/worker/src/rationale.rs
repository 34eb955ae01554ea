use scorecard_core::config::Settings;
use scorecard_core::llm::anthropic::AnthropicRationaleClient;
use scorecard_core::llm::template::TemplateRationale;
use scorecard_core::llm::RationaleGenerator;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Anthropic,
    Template,
}

fn choose(settings: &Settings, no_rationale: bool) -> anyhow::Result<Choice> {
    if no_rationale {
        return Ok(Choice::Template);
    }
    match settings.rationale_provider.as_deref() {
        Some("anthropic") => Ok(Choice::Anthropic),
        Some("template") => Ok(Choice::Template),
        Some(other) => anyhow::bail!("unknown RATIONALE_PROVIDER: {other}"),
        // Without an explicit choice, use Anthropic only when it is configured.
        None if settings.anthropic_api_key.is_some() => Ok(Choice::Anthropic),
        None => Ok(Choice::Template),
    }
}

/// Builds the rationale generator handed to the batch runner.
pub fn build(settings: &Settings, no_rationale: bool) -> anyhow::Result<Arc<dyn RationaleGenerator>> {
    let generator: Arc<dyn RationaleGenerator> = match choose(settings, no_rationale)? {
        Choice::Anthropic => Arc::new(AnthropicRationaleClient::from_settings(settings)?),
        Choice::Template => Arc::new(TemplateRationale),
    };
    tracing::info!(provider = generator.provider().as_str(), "rationale provider selected");
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: Option<&str>, api_key: Option<&str>) -> Settings {
        Settings {
            database_url: None,
            anthropic_api_key: api_key.map(str::to_string),
            sentry_dsn: None,
            rationale_provider: provider.map(str::to_string),
        }
    }

    #[test]
    fn explicit_provider_wins() {
        assert_eq!(choose(&settings(Some("template"), Some("k")), false).unwrap(), Choice::Template);
        assert_eq!(choose(&settings(Some("anthropic"), None), false).unwrap(), Choice::Anthropic);
        assert!(choose(&settings(Some("gemini"), None), false).is_err());
    }

    #[test]
    fn defaults_follow_api_key() {
        assert_eq!(choose(&settings(None, Some("k")), false).unwrap(), Choice::Anthropic);
        assert_eq!(choose(&settings(None, None), false).unwrap(), Choice::Template);
    }

    #[test]
    fn no_rationale_flag_forces_template() {
        assert_eq!(choose(&settings(Some("anthropic"), Some("k")), true).unwrap(), Choice::Template);
    }

    #[test]
    fn anthropic_without_key_fails_to_build() {
        assert!(build(&settings(Some("anthropic"), None), false).is_err());
    }
}
