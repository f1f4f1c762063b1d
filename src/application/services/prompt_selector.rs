use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{BackendClient, NewPrompt};
use crate::domain::{Credential, PromptFamily, PromptId, PromptRecord, VersionedPrompt};

use super::GatewayError;

/// Versioned prompts for one family, with at most one active at a time.
///
/// The same code serves all three families; the family decides which backend
/// collection and setting are addressed. Callers authorize before using it.
pub struct ActiveResourceSelector {
    backend: Arc<dyn BackendClient>,
}

impl ActiveResourceSelector {
    pub fn new(backend: Arc<dyn BackendClient>) -> Self {
        Self { backend }
    }

    pub async fn list_all(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, GatewayError> {
        Ok(self.backend.list_prompts(credential, family).await?)
    }

    pub async fn versions(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Vec<VersionedPrompt>, GatewayError> {
        let raw = self.list_all(credential, family).await?;
        decode_versions(family, raw)
    }

    pub async fn create(
        &self,
        credential: &Credential,
        family: PromptFamily,
        version: Option<String>,
        body: Option<String>,
    ) -> Result<Value, GatewayError> {
        let version = version.filter(|v| !v.trim().is_empty());
        let body = body.filter(|b| !b.trim().is_empty());
        let (Some(version), Some(prompt)) = (version, body) else {
            return Err(GatewayError::bad_request("Version and prompt are required"));
        };

        let created = self
            .backend
            .create_prompt(credential, family, &NewPrompt { version, prompt })
            .await?;
        tracing::info!(family = %family, "Prompt version created");
        Ok(created)
    }

    pub async fn get_active(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Value, GatewayError> {
        Ok(self.backend.active_prompt(credential, family).await?)
    }

    pub async fn active_version(
        &self,
        credential: &Credential,
        family: PromptFamily,
    ) -> Result<Option<VersionedPrompt>, GatewayError> {
        let raw = self.get_active(credential, family).await?;
        decode_active(family, raw)
    }

    /// Makes `prompt_id` the family's only active version.
    ///
    /// An id that is not among the family's versions fails with `NotFound`
    /// before the activation endpoint is called.
    pub async fn set_active(
        &self,
        credential: &Credential,
        family: PromptFamily,
        prompt_id: &PromptId,
    ) -> Result<VersionedPrompt, GatewayError> {
        let target = self
            .versions(credential, family)
            .await?
            .into_iter()
            .find(|prompt| &prompt.id == prompt_id)
            .ok_or_else(|| {
                GatewayError::NotFound(format!(
                    "{} prompt {} not found",
                    family.display_name(),
                    prompt_id
                ))
            })?;

        self.backend
            .activate_prompt(credential, family, prompt_id)
            .await?;

        tracing::info!(family = %family, prompt_id = %prompt_id, version = %target.version, "Prompt activated");
        Ok(VersionedPrompt {
            is_active: true,
            ..target
        })
    }
}

fn decode_versions(family: PromptFamily, raw: Value) -> Result<Vec<VersionedPrompt>, GatewayError> {
    let records: Vec<PromptRecord> = serde_json::from_value(raw).map_err(|e| {
        GatewayError::Internal(format!("unexpected {} prompt list shape: {}", family, e))
    })?;
    Ok(records
        .into_iter()
        .map(|record| VersionedPrompt::from_record(family, record))
        .collect())
}

fn decode_active(family: PromptFamily, raw: Value) -> Result<Option<VersionedPrompt>, GatewayError> {
    match raw {
        Value::Null => Ok(None),
        Value::Object(ref fields) if fields.is_empty() => Ok(None),
        other => {
            let record: PromptRecord = serde_json::from_value(other).map_err(|e| {
                GatewayError::Internal(format!("unexpected active {} prompt shape: {}", family, e))
            })?;
            Ok(Some(VersionedPrompt::from_record(family, record)))
        }
    }
}
