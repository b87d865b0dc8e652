//! 各後端在 context 上保證提供的名稱與型別。
//!
//! 這些 trait 只是讓下游以型別取值而不必轉型；是否真的掛上對應的 adapter
//! 仍要到執行期才知道，所以全部回傳 `Result`。

use crate::adapters::dynamodb::{DynamoDb, DYNAMODB, DYNAMODB_CLIENT};
use crate::adapters::s3::{S3, S3_CLIENT};
use crate::adapters::secrets_manager::{SecretsManager, SECRETS_MANAGER, SECRETS_MANAGER_CLIENT};
use crate::core::context::RequestContext;
use crate::utils::error::Result;

pub trait DynamoDbContext {
    fn dynamodb(&self) -> Result<&DynamoDb>;
    fn dynamodb_client(&self) -> Result<&aws_sdk_dynamodb::Client>;
}

pub trait S3Context {
    fn s3(&self) -> Result<&S3>;
    fn s3_client(&self) -> Result<&aws_sdk_s3::Client>;
}

pub trait SecretsManagerContext {
    fn secrets_manager(&self) -> Result<&SecretsManager>;
    fn secrets_manager_client(&self) -> Result<&aws_sdk_secretsmanager::Client>;
}

/// 三個後端合併後的 context
pub trait AwsContext: DynamoDbContext + S3Context + SecretsManagerContext {}

impl<T> AwsContext for T where T: DynamoDbContext + S3Context + SecretsManagerContext {}

impl DynamoDbContext for RequestContext {
    fn dynamodb(&self) -> Result<&DynamoDb> {
        self.require(DYNAMODB)
    }

    fn dynamodb_client(&self) -> Result<&aws_sdk_dynamodb::Client> {
        self.require(DYNAMODB_CLIENT)
    }
}

impl S3Context for RequestContext {
    fn s3(&self) -> Result<&S3> {
        self.require(S3)
    }

    fn s3_client(&self) -> Result<&aws_sdk_s3::Client> {
        self.require(S3_CLIENT)
    }
}

impl SecretsManagerContext for RequestContext {
    fn secrets_manager(&self) -> Result<&SecretsManager> {
        self.require(SECRETS_MANAGER)
    }

    fn secrets_manager_client(&self) -> Result<&aws_sdk_secretsmanager::Client> {
        self.require(SECRETS_MANAGER_CLIENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_aws_context<C: AwsContext>(ctx: &C) -> bool {
        ctx.dynamodb().is_err() && ctx.s3().is_err() && ctx.secrets_manager().is_err()
    }

    #[test]
    fn test_empty_context_reports_missing_resources() {
        let ctx = RequestContext::new();
        assert!(assert_aws_context(&ctx));

        let err = ctx.s3_client().unwrap_err();
        assert!(err.is_missing_resource());
        assert!(err.to_string().contains("S3Client"));
    }
}
