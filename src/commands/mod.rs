/*!
 * Command implementations for jujuctl
 *
 * Each command takes an open, logged-in [`ControllerApi`] and an
 * [`OutputWriter`]; `main` handles argument parsing and connection setup.
 */

use async_trait::async_trait;
use jujulib_connect::{
    Bakery, ClientError, ControllerApi, LoginOutcome, ModelOptions, ModelSummary,
};
use jujulib_wire::{Macaroon, ModelTag, UserTag};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{CliError, Result};
use crate::output::OutputWriter;

/// Refuses every discharge: jujuctl has no browser to complete an
/// identity-provider flow in.
pub struct NonInteractiveBakery;

#[async_trait]
impl Bakery for NonInteractiveBakery {
    async fn discharge(&self, _macaroon: Macaroon) -> std::result::Result<Vec<Macaroon>, String> {
        Err("interactive discharge is not supported; use a password or a discharged macaroon file"
            .to_string())
    }
}

/// Run `fut`, giving up after `limit`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| CliError::Timeout {
            secs: limit.as_secs(),
        })?
}

/// Open a connection and log in with the configured credentials.
pub async fn connect(config: &ClientConfig) -> Result<ControllerApi> {
    let url = config.api_url()?;
    let credentials = config.credentials()?;
    let use_macaroons = credentials
        .as_ref()
        .is_some_and(|c| c.password.is_empty() && c.macaroons.is_some());

    info!("Connecting to {}", url);
    let api = ControllerApi::connect(&url, credentials).await?;
    login(&api, use_macaroons).await?;
    Ok(api)
}

/// Log in with password credentials, or through the macaroon flow.
pub async fn login(api: &ControllerApi, use_macaroons: bool) -> Result<()> {
    if use_macaroons {
        api.login_with_macaroon(&NonInteractiveBakery).await?;
        return Ok(());
    }

    match api.login().await? {
        LoginOutcome::Authenticated => Ok(()),
        LoginOutcome::Skipped => Err(ClientError::MissingCredentials.into()),
    }
}

/// Accept `model-<uuid>` or a bare uuid.
pub fn parse_model_tag(s: &str) -> Result<ModelTag> {
    if s.starts_with("model-") {
        Ok(ModelTag::parse(s)?)
    } else if s.is_empty() {
        Err(CliError::Usage("empty model tag".to_string()))
    } else {
        Ok(ModelTag::from_uuid(s))
    }
}

fn parse_model_tags(tags: &[String]) -> Result<Vec<ModelTag>> {
    if tags.is_empty() {
        return Err(CliError::Usage("no models given".to_string()));
    }
    tags.iter().map(|t| parse_model_tag(t)).collect()
}

/// The logged-in user, for commands that default to "my models".
async fn session_user(api: &ControllerApi) -> Result<UserTag> {
    match api.credentials().await.user_tag() {
        Some(tag) => Ok(tag?),
        None => Err(ClientError::MissingCredentials.into()),
    }
}

fn check_partial(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        return Err(CliError::Partial { failed, total });
    }
    Ok(())
}

fn check_summaries(models: &[ModelSummary]) -> Result<()> {
    check_partial(
        models.iter().filter(|m| m.err.is_some()).count(),
        models.len(),
    )
}

pub async fn ping(api: &ControllerApi, out: &OutputWriter) -> Result<()> {
    api.ping().await?;
    let version = api.server_version().await;
    out.status(&match version {
        Some(v) => format!("Controller is alive (version {})", v),
        None => "Controller is alive".to_string(),
    });
    Ok(())
}

pub async fn facades(api: &ControllerApi, out: &OutputWriter) -> Result<()> {
    out.facades(&api.facades().await);
    Ok(())
}

/// List models. Without `owner` the logged-in user's models are listed;
/// `with_info` fetches full details for each.
pub async fn list_models(
    api: &ControllerApi,
    out: &OutputWriter,
    owner: Option<&str>,
    with_info: bool,
) -> Result<()> {
    let owner = match owner {
        Some(owner) => UserTag::parse(owner)?,
        None if with_info => return my_models(api, out).await,
        None => session_user(api).await?,
    };
    debug!("Listing models for {}", owner);

    let listings = api.list_models(&owner).await?;
    if !with_info {
        out.listings(&listings);
        return Ok(());
    }

    if listings.is_empty() {
        out.models(&[]);
        return Ok(());
    }

    let tags: Vec<ModelTag> = listings.iter().map(|l| l.tag.clone()).collect();
    let mut models = api.model_info(&tags).await?;
    for (model, listing) in models.iter_mut().zip(listings) {
        model.last_connection = listing.last_connection;
    }
    out.models(&models);
    check_summaries(&models)
}

/// Full details for the logged-in user's models
pub async fn my_models(api: &ControllerApi, out: &OutputWriter) -> Result<()> {
    let models = api.list_models_with_info().await?;
    out.models(&models);
    check_summaries(&models)
}

pub async fn model_info(api: &ControllerApi, out: &OutputWriter, tags: &[String]) -> Result<()> {
    let tags = parse_model_tags(tags)?;
    let models = api.model_info(&tags).await?;
    out.models(&models);
    check_summaries(&models)
}

pub async fn create_model(
    api: &ControllerApi,
    out: &OutputWriter,
    name: &str,
    owner: Option<&str>,
    options: ModelOptions,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CliError::Usage("model name must not be empty".to_string()));
    }
    let owner = match owner {
        Some(owner) => UserTag::parse(owner)?,
        None => session_user(api).await?,
    };

    let created = api.create_model_with(name, &owner, options).await?;
    out.created(&created);
    Ok(())
}

pub async fn destroy_models(
    api: &ControllerApi,
    out: &OutputWriter,
    tags: &[String],
) -> Result<()> {
    let tags = parse_model_tags(tags)?;
    let results = api.destroy_models(&tags).await?;
    out.destroyed(&results);
    check_partial(
        results.iter().filter(|r| r.error.is_some()).count(),
        results.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jujulib_connect::testing::MockController;
    use jujulib_connect::Credentials;
    use jujulib_wire::FacadeTable;
    use serde_json::json;

    async fn setup() -> (ControllerApi, MockController, OutputWriter) {
        let (api, controller) =
            MockController::pair(Some(Credentials::password("user-admin", "secret")));
        let facades: FacadeTable = [("ModelManager", &[2u32, 3][..]), ("Pinger", &[1u32][..])]
            .into_iter()
            .collect();
        api.set_facades(facades).await;
        (api, controller, OutputWriter::new(true))
    }

    #[test]
    fn test_parse_model_tag() {
        assert_eq!(parse_model_tag("model-abc").unwrap().uuid(), "abc");
        assert_eq!(parse_model_tag("abc").unwrap().to_string(), "model-abc");
        assert!(matches!(parse_model_tag(""), Err(CliError::Usage(_))));
        assert!(matches!(parse_model_tag("model-"), Err(CliError::Usage(_))));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_cli_error() {
        let result: Result<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CliError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_an_error() {
        let (api, mut controller) = MockController::pair(None);
        let err = login(&api, false).await.unwrap_err();
        assert!(matches!(
            err,
            CliError::Client(ClientError::MissingCredentials)
        ));
        assert!(controller.try_next_request().is_none());
    }

    #[tokio::test]
    async fn test_macaroon_login_refuses_interactive_discharge() {
        let (api, mut controller) = MockController::pair(None);

        let (result, _) = tokio::join!(login(&api, true), async {
            controller.next_request().await;
            controller.respond(1, json!({"discharge-required": "m"}));
        });

        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("macaroon discharge failed"));
        assert_eq!(err.exit_code(), crate::error::EXIT_FATAL);
    }

    #[tokio::test]
    async fn test_destroy_reports_partial_failure() {
        let (api, mut controller, out) = setup().await;
        let tags = vec!["model-a".to_string(), "b".to_string()];

        let (result, _) = tokio::join!(destroy_models(&api, &out, &tags), async {
            let request = controller.next_request().await;
            assert_eq!(request["version"], 3);
            assert_eq!(
                request["params"],
                json!({"entities": [{"tag": "model-a"}, {"tag": "model-b"}]})
            );
            controller.respond(1, json!({"results": [{}, {"error": {"message": "busy"}}]}));
        });

        assert!(matches!(
            result,
            Err(CliError::Partial { failed: 1, total: 2 })
        ));
    }

    #[tokio::test]
    async fn test_list_models_defaults_to_session_user() {
        let (api, mut controller, out) = setup().await;

        let (result, _) = tokio::join!(list_models(&api, &out, None, false), async {
            let request = controller.next_request().await;
            assert_eq!(request["params"], json!({"tag": "user-admin"}));
            controller.respond(1, json!({"user-models": []}));
        });
        result.unwrap();
    }

    #[tokio::test]
    async fn test_create_model_rejects_empty_name() {
        let (api, mut controller, out) = setup().await;
        let err = create_model(&api, &out, " ", None, ModelOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
        assert!(controller.try_next_request().is_none());
    }

    #[tokio::test]
    async fn test_create_model_for_session_user() {
        let (api, mut controller, out) = setup().await;

        let (result, _) = tokio::join!(
            create_model(&api, &out, "staging", None, ModelOptions::default()),
            async {
                let request = controller.next_request().await;
                assert_eq!(request["params"]["owner-tag"], "user-admin@local");
                controller.respond(
                    1,
                    json!({"name": "staging", "uuid": "u1", "owner-tag": "user-admin@local"}),
                );
            }
        );
        result.unwrap();
    }
}
