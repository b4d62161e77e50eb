//! sparkroles command-line client for the Spark roles resource.

#![forbid(unsafe_code)]

mod cli_config;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use sparkroles_application::{RoleListQuery, RoleService};
use sparkroles_core::{AppError, AppResult};
use sparkroles_domain::RoleId;
use sparkroles_infrastructure::HttpRolesApi;
use tracing::info;

use crate::cli_config::{CliConfig, init_tracing};

const USAGE: &str = "usage: sparkroles [verify | list [max] | get <role-id>]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Verify,
    List { max: Option<usize> },
    Get { role_id: RoleId },
}

impl Command {
    fn parse<I>(args: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let command = match args.next().as_deref() {
            None | Some("verify") => Self::Verify,
            Some("list") => {
                let max = args
                    .next()
                    .map(|value| {
                        value.parse::<usize>().map_err(|error| {
                            AppError::Validation(format!("invalid max value '{value}': {error}"))
                        })
                    })
                    .transpose()?;
                Self::List { max }
            }
            Some("get") => {
                let role_id = args
                    .next()
                    .ok_or_else(|| AppError::Validation(format!("missing role id; {USAGE}")))?;
                Self::Get {
                    role_id: RoleId::new(role_id)?,
                }
            }
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "unknown command '{other}'; {USAGE}"
                )));
            }
        };

        if let Some(extra) = args.next() {
            return Err(AppError::Validation(format!(
                "unexpected argument '{extra}'; {USAGE}"
            )));
        }

        Ok(command)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::List { .. } => "list",
            Self::Get { .. } => "get",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let command = Command::parse(env::args().skip(1))?;
    let config = CliConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let role_service = RoleService::new(Arc::new(HttpRolesApi::new(
        http_client,
        config.roles_api_config(),
    )));

    info!(
        api_base_url = %config.api_base_url,
        command = command.name(),
        max_attempts = config.max_attempts,
        page_size = config.page_size,
        "sparkroles started"
    );

    let output = run(&role_service, command).await?;
    println!("{output}");

    Ok(())
}

async fn run(role_service: &RoleService, command: Command) -> AppResult<String> {
    match command {
        Command::Verify => {
            if !role_service.verify_roles(&RoleListQuery::all()).await? {
                return Err(AppError::InvalidResponse(
                    "roles endpoint returned a malformed collection".to_owned(),
                ));
            }

            info!("roles response is valid");
            Ok("ok".to_owned())
        }
        Command::List { max } => {
            let query = RoleListQuery { max };
            let roles = role_service.list_roles(&query).await?;
            info!(count = roles.len(), "listed roles");
            to_pretty_json(&roles)
        }
        Command::Get { role_id } => {
            let role = role_service.get_role(&role_id).await?;
            to_pretty_json(&role)
        }
    }
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|error| AppError::Internal(format!("failed to render JSON output: {error}")))
}
