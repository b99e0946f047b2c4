use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use rolesync_application::{PlatformCaller, PlatformGateway};
use rolesync_core::{AppError, AppResult};
use rolesync_domain::{Account, AccountId, NewAccount, Role, RoleId};

mod dto;
mod queries;

use dto::{CreateUserData, CurrentUserData, GraphqlResponse, RolesData, UsersData};

const GRAPHQL_PATH: &str = "/.api/graphql";

/// How the platform's TLS certificate is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsVerification {
    /// Verify against the system trust store.
    System,
    /// Accept any certificate.
    Disabled,
    /// Verify against the PEM bundle at this path as well.
    CaBundle(PathBuf),
}

/// Connection settings for [`GraphqlPlatformGateway`].
#[derive(Debug, Clone)]
pub struct GraphqlPlatformGatewayConfig {
    /// Platform base URL; the GraphQL path is appended when missing.
    pub endpoint: String,
    /// Access token of a site admin.
    pub access_token: String,
    /// Certificate verification mode.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Attempts per call, the first one included.
    pub max_attempts: u8,
    /// Linear backoff step between attempts.
    pub retry_backoff_ms: u64,
}

/// Platform gateway over the GraphQL API.
///
/// Transport errors and HTTP 429/5xx are retried with linear backoff; GraphQL
/// `errors` and other HTTP statuses are final.
pub struct GraphqlPlatformGateway {
    http_client: reqwest::Client,
    endpoint: String,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl GraphqlPlatformGateway {
    /// Builds the HTTP client and validates the endpoint.
    pub fn new(config: GraphqlPlatformGatewayConfig) -> AppResult<Self> {
        let endpoint = normalize_graphql_endpoint(&config.endpoint)?;

        let mut authorization = HeaderValue::from_str(&format!("token {}", config.access_token))
            .map_err(|error| {
                AppError::Validation(format!("access token is not a valid header value: {error}"))
            })?;
        authorization.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout);

        match &config.tls {
            TlsVerification::System => {}
            TlsVerification::Disabled => {
                warn!(endpoint = %endpoint, "TLS certificate verification is disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsVerification::CaBundle(path) => {
                let pem = std::fs::read(path).map_err(|error| {
                    AppError::Validation(format!(
                        "failed to read CA bundle '{}': {error}",
                        path.display()
                    ))
                })?;
                let certificates = reqwest::Certificate::from_pem_bundle(&pem).map_err(|error| {
                    AppError::Validation(format!(
                        "CA bundle '{}' is not valid PEM: {error}",
                        path.display()
                    ))
                })?;
                for certificate in certificates {
                    builder = builder.add_root_certificate(certificate);
                }
            }
        }

        let http_client = builder.build().map_err(|error| {
            AppError::Internal(format!("failed to build platform HTTP client: {error}"))
        })?;

        Ok(Self {
            http_client,
            endpoint,
            max_attempts: config.max_attempts.max(1),
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Returns the GraphQL endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T>(&self, operation: &str, query: &str, variables: Value) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let body = json!({ "query": query, "variables": variables });
        let response: GraphqlResponse<T> = self.post_with_retry(operation, &body).await?;

        if !response.errors.is_empty() {
            return Err(AppError::Rejected(format!(
                "{operation}: {}",
                response
                    .errors
                    .iter()
                    .map(|error| error.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            )));
        }

        response.data.ok_or_else(|| {
            AppError::Internal(format!("{operation}: response carried neither data nor errors"))
        })
    }

    async fn post_with_retry<T>(&self, operation: &str, body: &Value) -> AppResult<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = self.http_client.post(&self.endpoint).json(body).send().await;

            match response {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|error| {
                        AppError::Internal(format!("{operation}: malformed response: {error}"))
                    });
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "{operation}: transient HTTP status {}",
                        response.status()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Rejected(format!(
                        "{operation}: HTTP status {status}: {body}"
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("{operation}: transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                debug!(
                    operation,
                    attempt,
                    delay_ms = delay,
                    error = last_error.as_deref().unwrap_or_default(),
                    "retrying platform request"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Unavailable(last_error.unwrap_or_else(|| {
            format!("{operation}: platform request exhausted retries")
        })))
    }
}

/// Validates a platform URL and returns its GraphQL endpoint.
pub fn normalize_graphql_endpoint(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|error| AppError::Validation(format!("invalid endpoint '{raw}': {error}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(format!(
            "endpoint '{raw}' must start with http:// or https://"
        )));
    }

    if trimmed.ends_with(GRAPHQL_PATH) {
        Ok(trimmed.to_owned())
    } else {
        Ok(format!("{trimmed}{GRAPHQL_PATH}"))
    }
}

#[async_trait]
impl PlatformGateway for GraphqlPlatformGateway {
    async fn current_caller(&self) -> AppResult<PlatformCaller> {
        let data: CurrentUserData = self
            .execute("currentUser", queries::CURRENT_USER, json!({}))
            .await?;
        let user = data.current_user.ok_or_else(|| {
            AppError::Forbidden("access token is not associated with a platform user".to_owned())
        })?;

        Ok(PlatformCaller {
            username: user.username,
            site_admin: user.site_admin,
        })
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let data: RolesData = self.execute("roles", queries::ROLES, json!({})).await?;
        data.roles
            .nodes
            .into_iter()
            .map(dto::RoleNode::into_domain)
            .collect()
    }

    async fn list_accounts(&self) -> AppResult<Vec<Account>> {
        let data: UsersData = self.execute("users", queries::USERS, json!({})).await?;
        data.users
            .nodes
            .into_iter()
            .map(dto::UserNode::into_domain)
            .collect()
    }

    async fn set_account_roles(
        &self,
        account_id: &AccountId,
        role_ids: &[RoleId],
    ) -> AppResult<()> {
        let _: IgnoredAny = self
            .execute(
                "setRoles",
                queries::SET_ROLES,
                json!({ "userId": account_id, "roleIds": role_ids }),
            )
            .await?;

        Ok(())
    }

    async fn create_account(&self, request: &NewAccount) -> AppResult<Account> {
        let data: CreateUserData = self
            .execute(
                "createUser",
                queries::CREATE_USER,
                json!({ "username": request.username, "email": request.email }),
            )
            .await?;

        data.create_user.user.into_domain()
    }
}
