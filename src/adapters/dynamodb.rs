use crate::config::BackendConfig;
use crate::core::adapter::ResourceAdapter;
use crate::domain::model::ResourceKey;
use crate::domain::ports::Backend;
use crate::utils::error::{AdapterError, Result};
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use std::collections::HashMap;

const SERVICE: &str = "DynamoDB";

pub type Item = HashMap<String, AttributeValue>;

pub const DYNAMODB: ResourceKey<DynamoDb> = ResourceKey::new("DynamoDB");
pub const DYNAMODB_CLIENT: ResourceKey<DynamoDbClient> = ResourceKey::new("DynamoDBClient");

/// DynamoDB 沒有服務專屬的設定，直接沿用共用的 `SdkConfig`
pub fn client_config(sdk: &SdkConfig) -> aws_sdk_dynamodb::Config {
    aws_sdk_dynamodb::Config::from(sdk)
}

/// 高階 DynamoDB handle：單一呼叫完成一次 item 操作
#[derive(Debug, Clone)]
pub struct DynamoDb {
    client: DynamoDbClient,
}

impl DynamoDb {
    pub fn new(client: DynamoDbClient) -> Self {
        Self { client }
    }

    /// 不讀環境變數，只依 `config` 建立（測試或已知端點用）
    pub fn from_conf(config: &BackendConfig) -> Self {
        Self::new(DynamoDbClient::from_conf(client_config(&config.to_sdk_config())))
    }

    pub fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|region| region.as_ref())
    }

    /// 讀取單一 item；不存在時回傳 `None`
    pub async fn get_item(&self, table: &str, key: Item) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "get_item", e))?;

        Ok(output.item)
    }

    pub async fn put_item(&self, table: &str, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "put_item", e))?;

        Ok(())
    }

    pub async fn delete_item(&self, table: &str, key: Item) -> Result<()> {
        self.client
            .delete_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "delete_item", e))?;

        Ok(())
    }

    /// 掃描整個 table 的第一頁結果
    pub async fn scan(&self, table: &str) -> Result<Vec<Item>> {
        let output = self
            .client
            .scan()
            .table_name(table)
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "scan", e))?;

        Ok(output.items.unwrap_or_default())
    }
}

pub struct DynamoDbBackend;

impl Backend for DynamoDbBackend {
    type Handle = DynamoDb;
    type Client = DynamoDbClient;

    const SERVICE: &'static str = SERVICE;
    const HANDLE: ResourceKey<DynamoDb> = DYNAMODB;
    const CLIENT: ResourceKey<DynamoDbClient> = DYNAMODB_CLIENT;

    fn connect(sdk: &SdkConfig, config: &BackendConfig) -> (DynamoDb, DynamoDbClient) {
        let conf = client_config(sdk);
        tracing::debug!(
            "🔧 {}: building handles (region: {:?}, endpoint: {:?})",
            SERVICE,
            conf.region(),
            config.endpoint_url
        );
        (
            DynamoDb::new(DynamoDbClient::from_conf(conf.clone())),
            DynamoDbClient::from_conf(conf),
        )
    }
}

pub type DynamoDbAdapter = ResourceAdapter<DynamoDbBackend>;

/// 建立 DynamoDB adapter；`None` 代表使用 SDK 預設值
pub fn dynamodb(config: impl Into<Option<BackendConfig>>) -> DynamoDbAdapter {
    ResourceAdapter::new(config)
}
