use crate::adapters::{dynamodb, s3, secrets_manager};
use crate::config::BackendConfig;
use crate::core::pipeline::Pipeline;
use crate::domain::ports::Handler;
use crate::utils::error::{AdapterError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_non_empty_string, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 一條路由要掛哪些 adapter，以及各自的設定
///
/// ```toml
/// [dynamodb]
/// region = "ap-northeast-1"
///
/// [s3]
/// endpoint_url = "http://localhost:4566"
/// force_path_style = true
///
/// [secrets_manager]
/// ```
///
/// 表格存在（即使是空的）就代表要掛上該 adapter。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdaptersConfig {
    pub dynamodb: Option<BackendConfig>,
    pub s3: Option<BackendConfig>,
    pub secrets_manager: Option<BackendConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
    pub json: Option<bool>,
}

impl AdaptersConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${AWS_ACCESS_KEY_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AdapterError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 依固定順序（DynamoDB → S3 → SecretsManager）列出要掛上的服務
    pub fn enabled_services(&self) -> Vec<&'static str> {
        let mut services = Vec::new();
        if self.dynamodb.is_some() {
            services.push("DynamoDB");
        }
        if self.s3.is_some() {
            services.push("S3");
        }
        if self.secrets_manager.is_some() {
            services.push("SecretsManager");
        }
        services
    }

    /// 建立一條掛好所有已設定 adapter 的 pipeline
    pub fn build_pipeline(&self, name: impl Into<String>, handler: impl Handler + 'static) -> Pipeline {
        let mut pipeline = Pipeline::new(name, handler);
        if let Some(config) = &self.dynamodb {
            pipeline.add_middleware(dynamodb(config.clone()));
        }
        if let Some(config) = &self.s3 {
            pipeline.add_middleware(s3(config.clone()));
        }
        if let Some(config) = &self.secrets_manager {
            pipeline.add_middleware(secrets_manager(config.clone()));
        }
        pipeline
    }

    pub fn verbose(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.verbose).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    fn backends(&self) -> [(&'static str, Option<&BackendConfig>); 3] {
        [
            ("dynamodb", self.dynamodb.as_ref()),
            ("s3", self.s3.as_ref()),
            ("secrets_manager", self.secrets_manager.as_ref()),
        ]
    }
}

fn validate_backend(section: &str, config: &BackendConfig) -> Result<()> {
    if let Some(region) = &config.region {
        validate_aws_region(&format!("{}.region", section), region)?;
    }

    if let Some(endpoint_url) = &config.endpoint_url {
        validate_url(&format!("{}.endpoint_url", section), endpoint_url)?;
    }

    if let Some(creds) = &config.credentials {
        validate_non_empty_string(
            &format!("{}.credentials.access_key_id", section),
            &creds.access_key_id,
        )?;
        validate_non_empty_string(
            &format!("{}.credentials.secret_access_key", section),
            &creds.secret_access_key,
        )?;
    }

    if let Some(max_attempts) = config.max_attempts {
        validate_range(&format!("{}.max_attempts", section), max_attempts, 1, 10)?;
    }

    if let Some(timeout_ms) = config.operation_timeout_ms {
        validate_range(
            &format!("{}.operation_timeout_ms", section),
            timeout_ms,
            1,
            600_000,
        )?;
    }

    if config.force_path_style.is_some() && section != "s3" {
        return Err(AdapterError::InvalidConfigValueError {
            field: format!("{}.force_path_style", section),
            value: "set".to_string(),
            reason: "force_path_style only applies to s3".to_string(),
        });
    }

    Ok(())
}

impl Validate for AdaptersConfig {
    fn validate(&self) -> Result<()> {
        for (section, config) in self.backends() {
            if let Some(config) = config {
                validate_backend(section, config)?;
            }
        }

        if self.enabled_services().is_empty() {
            return Err(AdapterError::MissingConfigError {
                field: "dynamodb | s3 | secrets_manager".to_string(),
            });
        }

        tracing::info!("✅ Adapter configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_toml_config() {
        let toml_content = r#"
[dynamodb]
region = "ap-northeast-1"

[s3]
endpoint_url = "http://localhost:4566"
force_path_style = true
max_attempts = 2

[logging]
verbose = true
"#;

        let config = AdaptersConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.dynamodb.as_ref().unwrap().region(), Some("ap-northeast-1"));
        let s3 = config.s3.as_ref().unwrap();
        assert_eq!(s3.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(s3.force_path_style, Some(true));
        assert_eq!(s3.max_attempts, Some(2));
        assert!(config.secrets_manager.is_none());
        assert_eq!(config.enabled_services(), vec!["DynamoDB", "S3"]);
        assert!(config.verbose());
        assert!(!config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_table_enables_adapter() {
        let config = AdaptersConfig::from_toml_str("[secrets_manager]\n").unwrap();
        assert!(config.secrets_manager.as_ref().unwrap().is_empty());
        assert_eq!(config.enabled_services(), vec!["SecretsManager"]);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ARC_TEST_SECRET_KEY", "from-env");

        let toml_content = r#"
[secrets_manager.credentials]
access_key_id = "AKIDEXAMPLE"
secret_access_key = "${ARC_TEST_SECRET_KEY}"
"#;

        let config = AdaptersConfig::from_toml_str(toml_content).unwrap();
        let creds = config
            .secrets_manager
            .as_ref()
            .and_then(|c| c.credentials.as_ref())
            .unwrap();
        assert_eq!(creds.secret_access_key, "from-env");

        std::env::remove_var("ARC_TEST_SECRET_KEY");
    }

    #[test]
    fn test_config_validation() {
        let bad_endpoint = AdaptersConfig::from_toml_str(
            r#"
[s3]
endpoint_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(bad_endpoint.validate().is_err());

        let bad_region = AdaptersConfig::from_toml_str(
            r#"
[dynamodb]
region = "Tokyo"
"#,
        )
        .unwrap();
        assert!(bad_region.validate().is_err());

        let path_style_on_dynamodb = AdaptersConfig::from_toml_str(
            r#"
[dynamodb]
force_path_style = true
"#,
        )
        .unwrap();
        assert!(path_style_on_dynamodb.validate().is_err());

        let nothing_enabled = AdaptersConfig::from_toml_str("").unwrap();
        assert!(matches!(
            nothing_enabled.validate(),
            Err(AdapterError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result = AdaptersConfig::from_toml_str(
            r#"
[s3]
regoin = "us-east-1"
"#,
        );
        assert!(matches!(result, Err(AdapterError::TomlError(_))));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[dynamodb]\nregion = \"eu-north-1\"\n")
            .unwrap();

        let config = AdaptersConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.dynamodb.unwrap().region.as_deref(), Some("eu-north-1"));
    }
}
