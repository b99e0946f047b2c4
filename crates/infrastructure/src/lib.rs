//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod graphql_platform_gateway;
mod json_lines_backup_sink;
mod ldap_directory_source;
mod static_directory_source;

pub use graphql_platform_gateway::{
    GraphqlPlatformGateway, GraphqlPlatformGatewayConfig, TlsVerification,
    normalize_graphql_endpoint,
};
pub use json_lines_backup_sink::JsonLinesBackupSink;
pub use ldap_directory_source::{LdapDirectoryConfig, LdapDirectorySource};
pub use static_directory_source::StaticDirectorySource;
