// Adapters layer: one resource-attachment adapter per AWS backend.

pub mod dynamodb;
pub mod s3;
pub mod secrets_manager;

pub use dynamodb::{dynamodb, DynamoDb, DynamoDbAdapter, DynamoDbBackend, DYNAMODB, DYNAMODB_CLIENT};
pub use s3::{s3, S3Adapter, S3Backend, S3, S3_CLIENT};
pub use secrets_manager::{
    secrets_manager, SecretsManager, SecretsManagerAdapter, SecretsManagerBackend,
    SECRETS_MANAGER, SECRETS_MANAGER_CLIENT,
};

/// 所有 adapter 會發布的名稱
pub const ALL_RESOURCE_NAMES: [&str; 6] = [
    "DynamoDB",
    "DynamoDBClient",
    "S3",
    "S3Client",
    "SecretsManager",
    "SecretsManagerClient",
];
