use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rolesync_application::ReconciliationOptions;
use rolesync_core::{AppError, AppResult, NonEmptyString};
use rolesync_infrastructure::{
    GraphqlPlatformGatewayConfig, LdapDirectoryConfig, TlsVerification,
    normalize_graphql_endpoint,
};
use url::Url;

const DEFAULT_BACKUP_FILE: &str = ".src_users_backup.json";
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Everything one worker process needs, validated up front.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub platform: GraphqlPlatformGatewayConfig,
    pub role_name: NonEmptyString,
    pub ldap: Option<LdapDirectoryConfig>,
    pub static_identities: Option<String>,
    pub backup_path: Option<PathBuf>,
    pub options: ReconciliationOptions,
    pub interval: Option<Duration>,
}

impl SyncConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, reporting every problem at once.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings {
            lookup,
            errors: Vec::new(),
        };

        let endpoint = settings.required("SRC_ENDPOINT");
        if let Some(endpoint) = &endpoint
            && let Err(error) = normalize_graphql_endpoint(endpoint)
        {
            settings.errors.push(format!("SRC_ENDPOINT: {error}"));
        }
        let access_token = settings.required("SRC_ACCESS_TOKEN");
        let role_name = settings
            .required("SRC_RBAC_ROLE_NAME")
            .and_then(|value| NonEmptyString::new(value).ok());
        let tls = settings.tls_verification("SRC_TLS_VERIFY");
        let max_attempts = settings.number::<u8>("SRC_HTTP_MAX_ATTEMPTS", 10);
        let timeout_seconds = settings.number::<u64>("SRC_HTTP_TIMEOUT_SECONDS", 30);
        if max_attempts == 0 {
            settings
                .errors
                .push("SRC_HTTP_MAX_ATTEMPTS must be greater than zero".to_owned());
        }
        if timeout_seconds == 0 {
            settings
                .errors
                .push("SRC_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned());
        }

        let backup_path = match (settings.lookup)("SRC_USERS_BACKUP_FILE") {
            None => Some(PathBuf::from(DEFAULT_BACKUP_FILE)),
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(PathBuf::from(value.trim())),
        };

        let ldap = settings.ldap();
        let static_identities = settings.optional("LIST_OF_USERS");

        let options = ReconciliationOptions {
            confirm_remove_all: settings.flag("REMOVE_ALL_USERS_FROM_RBAC_ROLE", false),
            additions_only: settings.flag("ADD_ONLY_SKIP_REMOVE", false),
            create_missing_accounts: settings.flag("CREATE_MISSING_USERS", false),
            dry_run: settings.flag("SYNC_DRY_RUN", false),
            verify: settings.flag("SYNC_VERIFY", true),
        };

        let interval = match settings.optional("SYNC_INTERVAL_SECONDS") {
            None => None,
            Some(value) => match value.parse::<u64>() {
                Ok(0) => {
                    settings
                        .errors
                        .push("SYNC_INTERVAL_SECONDS must be greater than zero".to_owned());
                    None
                }
                Ok(seconds) => Some(Duration::from_secs(seconds)),
                Err(error) => {
                    settings.errors.push(format!(
                        "invalid SYNC_INTERVAL_SECONDS value '{value}': {error}"
                    ));
                    None
                }
            },
        };

        match (endpoint, access_token, role_name, tls) {
            (Some(endpoint), Some(access_token), Some(role_name), Some(tls))
                if settings.errors.is_empty() =>
            {
                Ok(Self {
                    platform: GraphqlPlatformGatewayConfig {
                        endpoint,
                        access_token,
                        tls,
                        request_timeout: Duration::from_secs(timeout_seconds),
                        max_attempts,
                        retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
                    },
                    role_name,
                    ldap,
                    static_identities,
                    backup_path,
                    options,
                    interval,
                })
            }
            _ => Err(AppError::Configuration(settings.errors)),
        }
    }
}

struct Settings<F> {
    lookup: F,
    errors: Vec<String>,
}

impl<F> Settings<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; unset and blank are both `None`.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&mut self, name: &str) -> Option<String> {
        let value = self.optional(name);
        if value.is_none() {
            self.errors.push(format!("{name} is required"));
        }

        value
    }

    fn flag(&mut self, name: &str, default: bool) -> bool {
        let Some(value) = (self.lookup)(name) else {
            return default;
        };

        match parse_bool(&value) {
            Some(flag) => flag,
            None => {
                self.errors.push(format!(
                    "invalid {name} value '{value}': expected true/t/1 or false/f/0"
                ));
                default
            }
        }
    }

    fn number<T>(&mut self, name: &str, default: T) -> T
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(value) = self.optional(name) else {
            return default;
        };

        value.parse::<T>().unwrap_or_else(|error| {
            self.errors
                .push(format!("invalid {name} value '{value}': {error}"));
            default
        })
    }

    fn tls_verification(&mut self, name: &str) -> Option<TlsVerification> {
        let Some(value) = (self.lookup)(name) else {
            return Some(TlsVerification::System);
        };

        match parse_bool(&value) {
            Some(true) => Some(TlsVerification::System),
            Some(false) => Some(TlsVerification::Disabled),
            None => {
                let path = PathBuf::from(value.trim());
                if path.is_file() {
                    Some(TlsVerification::CaBundle(path))
                } else {
                    self.errors.push(format!(
                        "invalid {name} value '{value}': expected true, false, or a CA bundle file"
                    ));
                    None
                }
            }
        }
    }

    fn ldap(&mut self) -> Option<LdapDirectoryConfig> {
        let url = self.optional("LDAP_URL")?;
        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "ldap" | "ldaps") => {}
            Ok(_) => self
                .errors
                .push(format!("LDAP_URL '{url}' must start with ldap:// or ldaps://")),
            Err(error) => self
                .errors
                .push(format!("invalid LDAP_URL value '{url}': {error}")),
        }

        let group_dn = self.optional("LDAP_GROUP_DN");
        if group_dn.is_none() {
            self.errors
                .push("LDAP_GROUP_DN is required when LDAP_URL is set".to_owned());
        }
        let connect_timeout_seconds = self.number::<u64>("LDAP_CONNECT_TIMEOUT_SECONDS", 10);

        Some(LdapDirectoryConfig {
            url,
            bind_dn: self.optional("LDAP_BIND_DN"),
            bind_password: (self.lookup)("LDAP_BIND_PASSWORD").filter(|value| !value.is_empty()),
            group_dn: group_dn.unwrap_or_default(),
            member_attribute: self
                .optional("LDAP_GROUP_MEMBER_ATTRIBUTE")
                .unwrap_or_else(|| "member".to_owned()),
            user_id_attribute: self
                .optional("LDAP_USER_ID_ATTRIBUTE")
                .unwrap_or_else(|| "mail".to_owned()),
            connect_timeout: Duration::from_secs(connect_timeout_seconds),
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" | "" => Some(false),
        _ => None,
    }
}
