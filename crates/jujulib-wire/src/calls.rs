//! Typed facade calls.
//!
//! Every request the client issues through version negotiation is described by
//! a type implementing [`FacadeCall`]: the facade and method it targets, the
//! protocol versions its shape is valid for, and the response it decodes into.
//! A combination the server does not offer is refused before any frame is
//! written.

use crate::facade::FacadeVersions;
use crate::tags::ModelTag;
use crate::{Macaroon, RemoteError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// A request with a statically known facade, method and response schema.
pub trait FacadeCall: Serialize {
    const FACADE: &'static str;
    const METHOD: &'static str;
    /// Versions of the facade this request shape is valid for.
    const VERSIONS: &'static [u32];

    type Response: DeserializeOwned;
}

pub const ADMIN_FACADE: &str = "Admin";
pub const LOGIN_METHOD: &str = "Login";
pub const LOGIN_VERSION: u32 = 3;

pub const PINGER_FACADE: &str = "Pinger";
pub const PING_METHOD: &str = "Ping";
pub const PING_VERSION: u32 = 1;

pub const MODEL_MANAGER_FACADE: &str = "ModelManager";
const MODEL_MANAGER_VERSIONS: &[u32] = &[2, 3];

// ─── Admin ──────────────────────────────────────────────────────────────────

/// Parameters of `Admin.Login`.
///
/// Serialises to `{"auth-tag", "credentials"}` for password logins,
/// `{"macaroons": [[...]]}` for macaroon logins and `{}` for an anonymous
/// first attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "auth-tag", skip_serializing_if = "Option::is_none", default)]
    pub auth_tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub credentials: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub macaroons: Option<Vec<Vec<Macaroon>>>,
}

impl LoginRequest {
    pub fn password(auth_tag: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            auth_tag: Some(auth_tag.into()),
            credentials: Some(password.into()),
            macaroons: None,
        }
    }

    /// A macaroon login; `None` or an empty set sends no macaroons at all.
    pub fn macaroons(macaroons: Option<Vec<Macaroon>>) -> Self {
        Self {
            macaroons: macaroons.filter(|m| !m.is_empty()).map(|m| vec![m]),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserInfo {
    #[serde(default)]
    pub identity: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub controller_access: Option<String>,

    #[serde(default)]
    pub model_access: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoginResult {
    #[serde(default)]
    pub user_info: Option<UserInfo>,

    #[serde(default)]
    pub facades: Vec<FacadeVersions>,

    #[serde(default)]
    pub discharge_required: Option<Macaroon>,

    #[serde(default)]
    pub discharge_required_error: Option<String>,

    #[serde(default)]
    pub server_version: Option<String>,

    #[serde(default)]
    pub controller_tag: Option<String>,
}

// ─── Pinger ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ping {}

// ─── ModelManager ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    pub entities: Vec<Entity>,
}

impl<'a> FromIterator<&'a ModelTag> for Entities {
    fn from_iter<I: IntoIterator<Item = &'a ModelTag>>(iter: I) -> Self {
        Self {
            entities: iter
                .into_iter()
                .map(|tag| Entity {
                    tag: tag.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

/// The `results` array of a bulk call, kept as the controller sent it.
///
/// Entries are decoded one at a time by [`BulkResults::entries`], so a
/// malformed entry only affects itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct BulkResults<T> {
    #[serde(default)]
    pub results: Vec<Value>,

    #[serde(skip)]
    entry: PhantomData<T>,
}

impl<T: DeserializeOwned> BulkResults<T> {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The raw array as JSON text.
    pub fn to_json(&self) -> String {
        Value::Array(self.results.clone()).to_string()
    }

    pub fn entries(self) -> impl Iterator<Item = Result<T, serde_json::Error>> {
        self.results
            .into_iter()
            .map(|value| serde_json::from_value::<T>(value))
    }
}

pub type ErrorResults = BulkResults<ErrorResult>;

/// `ModelManager.DestroyModels`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DestroyModels(pub Entities);

impl FacadeCall for DestroyModels {
    const FACADE: &'static str = MODEL_MANAGER_FACADE;
    const METHOD: &'static str = "DestroyModels";
    const VERSIONS: &'static [u32] = MODEL_MANAGER_VERSIONS;
    type Response = ErrorResults;
}

/// Model details as reported by `ModelInfo` and `CreateModel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModelInfo {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub controller_uuid: String,

    #[serde(default)]
    pub provider_type: String,

    #[serde(default)]
    pub default_series: String,

    #[serde(default)]
    pub life: String,

    #[serde(default)]
    pub owner_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfoResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ModelInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
}

pub type ModelInfoResults = BulkResults<ModelInfoResult>;

/// `ModelManager.ModelInfo`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GetModelInfo(pub Entities);

impl FacadeCall for GetModelInfo {
    const FACADE: &'static str = MODEL_MANAGER_FACADE;
    const METHOD: &'static str = "ModelInfo";
    const VERSIONS: &'static [u32] = MODEL_MANAGER_VERSIONS;
    type Response = ModelInfoResults;
}

/// `ModelManager.ListModels`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListModels {
    pub tag: String,
}

impl FacadeCall for ListModels {
    const FACADE: &'static str = MODEL_MANAGER_FACADE;
    const METHOD: &'static str = "ListModels";
    const VERSIONS: &'static [u32] = MODEL_MANAGER_VERSIONS;
    type Response = UserModelList;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Model {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub owner_tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserModel {
    pub model: Model,

    #[serde(default)]
    pub last_connection: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserModelList {
    #[serde(default)]
    pub user_models: Vec<UserModel>,
}

/// `ModelManager.CreateModel`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateModel {
    pub name: String,

    pub owner_tag: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl FacadeCall for CreateModel {
    const FACADE: &'static str = MODEL_MANAGER_FACADE;
    const METHOD: &'static str = "CreateModel";
    const VERSIONS: &'static [u32] = MODEL_MANAGER_VERSIONS;
    type Response = ModelInfo;
}
