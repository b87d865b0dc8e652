use crate::config::BackendConfig;
use crate::core::adapter::ResourceAdapter;
use crate::domain::model::ResourceKey;
use crate::domain::ports::Backend;
use crate::utils::error::{AdapterError, Result};
use aws_config::SdkConfig;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

const SERVICE: &str = "S3";

pub const S3: ResourceKey<S3> = ResourceKey::new("S3");
pub const S3_CLIENT: ResourceKey<S3Client> = ResourceKey::new("S3Client");

pub fn client_config(sdk: &SdkConfig, config: &BackendConfig) -> aws_sdk_s3::Config {
    let mut builder = Builder::from(sdk);
    // MinIO、LocalStack 這類本地端點需要 path-style
    if let Some(force_path_style) = config.force_path_style {
        builder = builder.force_path_style(force_path_style);
    }
    builder.build()
}

/// 高階 S3 handle：以 bucket + key 直接讀寫物件
#[derive(Debug, Clone)]
pub struct S3 {
    client: S3Client,
}

impl S3 {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &BackendConfig) -> Self {
        Self::new(S3Client::from_conf(client_config(&config.to_sdk_config(), config)))
    }

    pub fn client(&self) -> &S3Client {
        &self.client
    }

    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(|region| region.as_ref())
    }

    /// 讀取整個物件；key 不存在時回傳 `None`
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<Bytes>> {
        let resp = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(resp) => resp,
            Err(err) => {
                if err.as_service_error().is_some_and(GetObjectError::is_no_such_key) {
                    tracing::debug!("📂 {}: s3://{}/{} does not exist", SERVICE, bucket, key);
                    return Ok(None);
                }
                return Err(AdapterError::backend(SERVICE, "get_object", err));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "get_object", e))?;

        Ok(Some(data.into_bytes()))
    }

    pub async fn put_object(&self, bucket: &str, key: &str, body: impl Into<Bytes>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body.into()))
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "put_object", e))?;

        Ok(())
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "delete_object", e))?;

        Ok(())
    }

    /// 列出 bucket 中（可選前綴）的 key，只取第一頁
    pub async fn list_keys(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .send()
            .await
            .map_err(|e| AdapterError::backend(SERVICE, "list_objects_v2", e))?;

        Ok(output
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect())
    }
}

pub struct S3Backend;

impl Backend for S3Backend {
    type Handle = S3;
    type Client = S3Client;

    const SERVICE: &'static str = SERVICE;
    const HANDLE: ResourceKey<S3> = S3;
    const CLIENT: ResourceKey<S3Client> = S3_CLIENT;

    fn connect(sdk: &SdkConfig, config: &BackendConfig) -> (S3, S3Client) {
        let conf = client_config(sdk, config);
        tracing::debug!(
            "🔧 {}: building handles (region: {:?}, endpoint: {:?})",
            SERVICE,
            conf.region(),
            config.endpoint_url
        );
        (
            S3::new(S3Client::from_conf(conf.clone())),
            S3Client::from_conf(conf),
        )
    }
}

pub type S3Adapter = ResourceAdapter<S3Backend>;

pub fn s3(config: impl Into<Option<BackendConfig>>) -> S3Adapter {
    ResourceAdapter::new(config)
}
