#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 連到某個後端所需的設定，於註冊 adapter 時給定一次，之後唯讀
///
/// 空設定代表全部交給 SDK 的預設值決定。adapter 本身不驗證任何欄位，
/// 不合法的值會原封不動交給 SDK。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub credentials: Option<StaticCredentials>,
    pub max_attempts: Option<u32>,
    pub operation_timeout_ms: Option<u64>,
    /// 只有 S3 使用
    pub force_path_style: Option<bool>,
    /// 由 `aws_config` 載入的共用設定（憑證鏈、區域等）
    #[serde(skip)]
    pub shared: Option<SdkConfig>,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以環境的 AWS 預設值（環境變數、profile、IMDS）作為基底
    pub async fn from_env() -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new().with_shared_config(shared)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_force_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = Some(force_path_style);
        self
    }

    pub fn with_shared_config(mut self, shared: SdkConfig) -> Self {
        self.shared = Some(shared);
        self
    }

    /// 明確指定的區域優先，其次是共用設定中的區域
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref().or_else(|| {
            self.shared
                .as_ref()
                .and_then(|shared| shared.region())
                .map(|region| region.as_ref())
        })
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// 解析出所有服務共用的 `SdkConfig`
    ///
    /// 有 `shared` 時以它為基底；否則走 SDK 的預設載入鏈（環境變數、profile、IMDS），
    /// 明確給定的 region 與憑證會直接取代對應的載入鏈。
    pub async fn load_sdk_config(&self) -> SdkConfig {
        if let Some(shared) = &self.shared {
            return self.overlay(shared);
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(creds) = &self.credentials {
            loader = loader.credentials_provider(creds.to_credentials());
        }
        let ambient = loader.load().await;
        self.overlay(&ambient)
    }

    /// 不讀環境，只用 `shared`（若有）加上本設定的覆寫值
    pub fn to_sdk_config(&self) -> SdkConfig {
        match &self.shared {
            Some(shared) => self.overlay(shared),
            None => self.overlay(&SdkConfig::builder().build()),
        }
    }

    fn overlay(&self, base: &SdkConfig) -> SdkConfig {
        let mut builder = base.to_builder();
        // 沒有 behavior version 的話 SDK client 建構時會 panic
        if base.behavior_version().is_none() {
            builder = builder.behavior_version(BehaviorVersion::latest());
        }
        if let Some(region) = &self.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint_url.clone());
        }
        if let Some(creds) = &self.credentials {
            builder = builder.credentials_provider(SharedCredentialsProvider::new(creds.to_credentials()));
        }
        if let Some(max_attempts) = self.max_attempts {
            builder = builder.retry_config(RetryConfig::standard().with_max_attempts(max_attempts));
        }
        if let Some(timeout) = self.operation_timeout() {
            builder = builder.timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build());
        }
        builder.build()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_none()
            && self.endpoint_url.is_none()
            && self.credentials.is_none()
            && self.max_attempts.is_none()
            && self.operation_timeout_ms.is_none()
            && self.force_path_style.is_none()
            && self.shared.is_none()
    }
}

/// 靜態憑證覆寫（測試或本地模擬器用）
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl StaticCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, session_token: impl Into<String>) -> Self {
        self.session_token = Some(session_token.into());
        self
    }

    pub fn to_credentials(&self) -> Credentials {
        Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            self.session_token.clone(),
            None,
            "aws-request-context",
        )
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}
