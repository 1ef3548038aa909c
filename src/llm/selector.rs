use crate::config::DelveConfig;
use crate::llm::{GenAITextGeneration, RecordingTextGeneration, TextGeneration};
use anyhow::{Context, Result};
use genai::adapter::AdapterKind;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SelectedClient {
    pub client: Arc<dyn TextGeneration>,
    pub provider: AdapterKind,
    pub description: String,
}

/// Builds the text generation client described by `config`.
///
/// Cloud providers need their API key variable to be present. When
/// `DELVE_RECORDING_MODE` is set the client is wrapped for record/replay.
pub fn select_text_generation(config: &DelveConfig) -> Result<SelectedClient> {
    let provider = config.provider;

    if !provider_has_credentials(provider) {
        anyhow::bail!(
            "No credentials for {}. Set {} or choose another provider with DELVE_PROVIDER",
            provider,
            provider.default_key_env_name().unwrap_or("the provider API key")
        );
    }

    let client = GenAITextGeneration::new(
        provider,
        config.model.clone(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    )
    .with_context(|| format!("Failed to initialize {}", provider))?;

    let description = format!("{} ({})", provider, config.model);
    let client: Arc<dyn TextGeneration> = Arc::new(client);

    let client = if std::env::var("DELVE_RECORDING_MODE").is_ok() {
        let recording = RecordingTextGeneration::from_env(client)?;
        debug!("Recording model exchanges in {:?} mode", recording.mode());
        Arc::new(recording) as Arc<dyn TextGeneration>
    } else {
        client
    };

    info!("Using text generation: {}", description);
    Ok(SelectedClient {
        client,
        provider,
        description,
    })
}

/// Check if provider has available credentials
fn provider_has_credentials(provider: AdapterKind) -> bool {
    match provider.default_key_env_name() {
        None => true,
        Some(env_var) => std::env::var(env_var).is_ok(),
    }
}
