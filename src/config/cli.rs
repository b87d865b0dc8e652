use crate::config::toml_config::AdaptersConfig;
use crate::config::{BackendConfig, StaticCredentials};
use crate::utils::error::{AdapterError, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Dynamodb,
    S3,
    SecretsManager,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "aws-request-context")]
#[command(about = "Attach per-request AWS SDK handles to a pipeline and report what a handler sees")]
pub struct CliConfig {
    #[arg(long, help = "TOML file describing which adapters to attach")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, value_delimiter = ',', help = "Adapters to attach (overrides the file)")]
    pub services: Vec<Service>,

    #[arg(long, help = "Region applied to every selected adapter")]
    pub region: Option<String>,

    #[arg(long, help = "Endpoint override applied to every selected adapter")]
    pub endpoint_url: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, help = "Load the ambient AWS configuration once up front and share it across adapters")]
    pub ambient: bool,

    #[arg(long, default_value = "/", help = "Path of the synthetic request")]
    pub path: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// 合併設定檔與命令列參數；命令列優先
    pub async fn resolve(&self) -> Result<AdaptersConfig> {
        let mut adapters = match &self.config {
            Some(path) => AdaptersConfig::from_file(path)?,
            None => AdaptersConfig::default(),
        };

        if !self.services.is_empty() {
            adapters.dynamodb = self.keep(Service::Dynamodb, adapters.dynamodb.take());
            adapters.s3 = self.keep(Service::S3, adapters.s3.take());
            adapters.secrets_manager =
                self.keep(Service::SecretsManager, adapters.secrets_manager.take());
        }

        let shared = if self.ambient {
            tracing::info!("🌐 Loading ambient AWS configuration");
            Some(BackendConfig::from_env().await)
        } else {
            None
        };

        for config in [
            &mut adapters.dynamodb,
            &mut adapters.s3,
            &mut adapters.secrets_manager,
        ]
        .into_iter()
        .flatten()
        {
            self.apply_overrides(config, shared.as_ref())?;
        }

        Ok(adapters)
    }

    fn keep(&self, service: Service, existing: Option<BackendConfig>) -> Option<BackendConfig> {
        if self.services.contains(&service) {
            Some(existing.unwrap_or_default())
        } else {
            None
        }
    }

    fn apply_overrides(&self, config: &mut BackendConfig, shared: Option<&BackendConfig>) -> Result<()> {
        if let Some(region) = &self.region {
            config.region = Some(region.clone());
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            config.endpoint_url = Some(endpoint_url.clone());
        }
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                config.credentials = Some(StaticCredentials::new(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(AdapterError::ConfigError {
                    message: "access key id and secret access key must be given together"
                        .to_string(),
                });
            }
            (None, None) => {}
        }
        if config.shared.is_none() {
            config.shared = shared.and_then(|s| s.shared.clone());
        }
        Ok(())
    }
}
