pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{dynamodb, s3, secrets_manager, DynamoDb, SecretsManager, S3};
pub use config::{toml_config::AdaptersConfig, BackendConfig, StaticCredentials};
pub use crate::core::{
    handler_fn, AwsContext, DynamoDbContext, Pipeline, RequestContext, ResourceAdapter, S3Context,
    SecretsManagerContext,
};
pub use utils::error::{AdapterError, Result};
