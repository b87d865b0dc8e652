use crate::config::BackendConfig;
use crate::core::adapter::ResourceAdapter;
use crate::domain::model::ResourceKey;
use crate::domain::ports::Backend;
use crate::utils::error::{AdapterError, Result};
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::operation::get_secret_value::{
    GetSecretValueError, GetSecretValueOutput,
};
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use serde::de::DeserializeOwned;

const SERVICE: &str = "SecretsManager";

pub const SECRETS_MANAGER: ResourceKey<SecretsManager> = ResourceKey::new("SecretsManager");
pub const SECRETS_MANAGER_CLIENT: ResourceKey<SecretsManagerClient> =
    ResourceKey::new("SecretsManagerClient");

pub fn client_config(sdk: &SdkConfig) -> aws_sdk_secretsmanager::Config {
    aws_sdk_secretsmanager::Config::from(sdk)
}

#[derive(Debug, Clone)]
pub struct SecretsManager {
    client: SecretsManagerClient,
}

impl SecretsManager {
    pub fn new(client: SecretsManagerClient) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &BackendConfig) -> Self {
        Self::new(SecretsManagerClient::from_conf(client_config(&config.to_sdk_config())))
    }

    pub fn client(&self) -> &SecretsManagerClient {
        &self.client
    }

    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|region| region.as_ref())
    }

    async fn get_secret_value(&self, secret_id: &str) -> Result<Option<GetSecretValueOutput>> {
        match self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
        {
            Ok(output) => Ok(Some(output)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(GetSecretValueError::is_resource_not_found_exception) =>
            {
                tracing::debug!("🔐 {}: secret '{}' not found", SERVICE, secret_id);
                Ok(None)
            }
            Err(err) => Err(AdapterError::backend(SERVICE, "get_secret_value", err)),
        }
    }

    /// 取得字串型態的 secret；不存在時回傳 `None`
    pub async fn get_secret_string(&self, secret_id: &str) -> Result<Option<String>> {
        Ok(self
            .get_secret_value(secret_id)
            .await?
            .and_then(|output| output.secret_string))
    }

    pub async fn get_secret_binary(&self, secret_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .get_secret_value(secret_id)
            .await?
            .and_then(|output| output.secret_binary)
            .map(|blob| blob.into_inner()))
    }

    /// 取得 secret 並以 JSON 反序列化（例如資料庫帳密）
    pub async fn get_secret_json<T: DeserializeOwned>(&self, secret_id: &str) -> Result<Option<T>> {
        match self.get_secret_string(secret_id).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// 建立新的 secret，回傳其 ARN
    pub async fn create_secret(&self, name: &str, value: &str) -> Result<Option<String>> {
        let output = self
            .client
            .create_secret()
            .name(name)
            .secret_string(value)
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "create_secret", e))?;

        Ok(output.arn)
    }

    pub async fn put_secret_string(&self, secret_id: &str, value: &str) -> Result<()> {
        self.client
            .put_secret_value()
            .secret_id(secret_id)
            .secret_string(value)
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "put_secret_value", e))?;

        Ok(())
    }

    pub async fn delete_secret(&self, secret_id: &str, force: bool) -> Result<()> {
        self.client
            .delete_secret()
            .secret_id(secret_id)
            .force_delete_without_recovery(force)
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "delete_secret", e))?;

        Ok(())
    }
}

pub struct SecretsManagerBackend;

impl Backend for SecretsManagerBackend {
    type Handle = SecretsManager;
    type Client = SecretsManagerClient;

    const SERVICE: &'static str = SERVICE;
    const HANDLE: ResourceKey<SecretsManager> = SECRETS_MANAGER;
    const CLIENT: ResourceKey<SecretsManagerClient> = SECRETS_MANAGER_CLIENT;

    fn connect(sdk: &SdkConfig, config: &BackendConfig) -> (SecretsManager, SecretsManagerClient) {
        let conf = client_config(sdk);
        tracing::debug!(
            "🔧 {}: building handles (region: {:?}, endpoint: {:?})",
            SERVICE,
            conf.region(),
            config.endpoint_url
        );
        (
            SecretsManager::new(SecretsManagerClient::from_conf(conf.clone())),
            SecretsManagerClient::from_conf(conf),
        )
    }
}

pub type SecretsManagerAdapter = ResourceAdapter<SecretsManagerBackend>;

pub fn secrets_manager(config: impl Into<Option<BackendConfig>>) -> SecretsManagerAdapter {
    ResourceAdapter::new(config)
}
