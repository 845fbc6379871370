//! Model lifecycle operations on the `ModelManager` facade.

use crate::controller::ControllerApi;
use crate::error::{ClientError, Result};
use jujulib_wire::calls::{
    BulkResults, CreateModel, DestroyModels, GetModelInfo, ListModels, ModelInfo,
    ModelInfoResult,
};
use jujulib_wire::{ModelTag, UserTag};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// One model as shown to users, built from a `ModelInfo` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSummary {
    pub tag: ModelTag,
    pub name: String,
    /// Owner as `name@domain`
    pub owner: String,
    pub uuid: String,
    pub provider: String,
    pub series: String,
    pub life: String,
    pub server_uuid: String,
    pub owner_tag: String,
    pub is_alive: bool,
    /// True for the controller model itself.
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_connection: Option<String>,
    /// Set when the controller could not describe this model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl ModelSummary {
    pub fn from_info(tag: ModelTag, info: ModelInfo) -> Self {
        let owner = UserTag::parse(&info.owner_tag)
            .map(|owner| owner.canonical_name())
            .unwrap_or_else(|_| info.owner_tag.clone());

        Self {
            tag,
            owner,
            is_alive: info.life != "dead",
            is_admin: !info.uuid.is_empty() && info.uuid == info.controller_uuid,
            name: info.name,
            uuid: info.uuid,
            provider: info.provider_type,
            series: info.default_series,
            life: info.life,
            server_uuid: info.controller_uuid,
            owner_tag: info.owner_tag,
            last_connection: None,
            err: None,
        }
    }

    /// A placeholder for a model whose info could not be fetched.
    pub fn failed(tag: ModelTag, err: impl Into<String>) -> Self {
        Self {
            tag,
            name: String::new(),
            owner: String::new(),
            uuid: String::new(),
            provider: String::new(),
            series: String::new(),
            life: String::new(),
            server_uuid: String::new(),
            owner_tag: String::new(),
            is_alive: false,
            is_admin: false,
            last_connection: None,
            err: Some(err.into()),
        }
    }

    fn from_result(tag: ModelTag, entry: ModelInfoResult) -> Self {
        match (entry.result, entry.error) {
            (_, Some(error)) => Self::failed(tag, error.message),
            (Some(info), None) => Self::from_info(tag, info),
            (None, None) => Self::failed(tag, "no model info returned"),
        }
    }
}

/// A model a user can access, as returned by `ListModels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelListing {
    pub name: String,
    pub tag: ModelTag,
    /// Owner tag as reported, e.g. `user-who`
    pub owner: String,
    pub uuid: String,
    pub last_connection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedModel {
    pub name: String,
    pub uuid: String,
    pub owner: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestroyResult {
    pub tag: ModelTag,
    pub error: Option<String>,
}

/// Optional `CreateModel` parameters. Unset fields are left to the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelOptions {
    pub config: Option<Map<String, Value>>,
    pub cloud_tag: Option<String>,
    pub region: Option<String>,
    pub credential: Option<String>,
}

fn unexpected<T: DeserializeOwned>(results: &BulkResults<T>) -> ClientError {
    ClientError::UnexpectedResults(results.to_json())
}

impl ControllerApi {
    /// Destroy the given models. Per-model failures are reported in the
    /// returned list, in input order.
    pub async fn destroy_models(&self, tags: &[ModelTag]) -> Result<Vec<DestroyResult>> {
        let response = self.call(&DestroyModels(tags.iter().collect())).await?;
        if response.len() != tags.len() {
            return Err(unexpected(&response));
        }

        let results: Vec<_> = tags
            .iter()
            .zip(response.entries())
            .map(|(tag, entry)| DestroyResult {
                tag: tag.clone(),
                error: match entry {
                    Ok(result) => result.error.map(|e| e.message),
                    Err(e) => Some(format!("malformed result: {}", e)),
                },
            })
            .collect();

        info!(
            "Destroyed {} of {} model(s)",
            results.iter().filter(|r| r.error.is_none()).count(),
            results.len()
        );
        Ok(results)
    }

    /// Fetch details for the given models in one request.
    pub async fn model_info(&self, tags: &[ModelTag]) -> Result<Vec<ModelSummary>> {
        let response = self.call(&GetModelInfo(tags.iter().collect())).await?;
        if response.len() != tags.len() {
            return Err(unexpected(&response));
        }

        Ok(tags
            .iter()
            .cloned()
            .zip(response.entries())
            .map(|(tag, entry)| match entry {
                Ok(entry) => ModelSummary::from_result(tag, entry),
                Err(e) => ModelSummary::failed(tag, format!("malformed model info: {}", e)),
            })
            .collect())
    }

    /// List the models `owner` can access.
    pub async fn list_models(&self, owner: &UserTag) -> Result<Vec<ModelListing>> {
        let response = self
            .call(&ListModels {
                tag: owner.to_string(),
            })
            .await?;

        debug!("{} has {} model(s)", owner, response.user_models.len());
        Ok(response
            .user_models
            .into_iter()
            .map(|entry| ModelListing {
                tag: ModelTag::from_uuid(entry.model.uuid.clone()),
                name: entry.model.name,
                owner: entry.model.owner_tag,
                uuid: entry.model.uuid,
                last_connection: entry.last_connection,
            })
            .collect())
    }

    /// List the logged-in user's models with full details.
    ///
    /// Fails with [`ClientError::MissingCredentials`] before sending anything
    /// when no user is known.
    pub async fn list_models_with_info(&self) -> Result<Vec<ModelSummary>> {
        let user = self.session.read().await.credentials.user_tag();
        let owner = user.ok_or(ClientError::MissingCredentials)??;

        let listings = self.list_models(&owner).await?;
        if listings.is_empty() {
            return Ok(Vec::new());
        }

        let tags: Vec<ModelTag> = listings.iter().map(|l| l.tag.clone()).collect();
        let mut summaries = self.model_info(&tags).await?;
        for (summary, listing) in summaries.iter_mut().zip(listings) {
            summary.last_connection = listing.last_connection;
        }
        Ok(summaries)
    }

    /// Create a model owned by `owner`. Owners without a domain are local users.
    pub async fn create_model(&self, name: &str, owner: &UserTag) -> Result<CreatedModel> {
        self.create_model_with(name, owner, ModelOptions::default())
            .await
    }

    pub async fn create_model_with(
        &self,
        name: &str,
        owner: &UserTag,
        options: ModelOptions,
    ) -> Result<CreatedModel> {
        let owner_tag = owner.clone().with_default_domain();
        let params = CreateModel {
            name: name.to_string(),
            owner_tag: owner_tag.to_string(),
            config: options.config,
            cloud_tag: options.cloud_tag,
            region: options.region,
            credential: options.credential,
        };

        let info = self.call(&params).await?;
        info!("Created model {} ({}) for {}", info.name, info.uuid, owner_tag);
        Ok(CreatedModel {
            name: info.name,
            uuid: info.uuid,
            owner: info.owner_tag,
            region: info.cloud_region,
        })
    }
}
