use aws_request_context::adapters::ALL_RESOURCE_NAMES;
use aws_request_context::core::{DynamoDbContext, S3Context, SecretsManagerContext};
use aws_request_context::utils::{logger, validation::Validate};
use aws_request_context::{handler_fn, AdapterError, CliConfig, RequestContext};
use bytes::Bytes;
use clap::Parser;
use serde_json::json;

/// 描述 handler 在 context 中看得到的資源
fn describe_context(ctx: &RequestContext) -> serde_json::Value {
    let slots: serde_json::Map<String, serde_json::Value> = ALL_RESOURCE_NAMES
        .iter()
        .map(|name| {
            let slot = match ctx.type_name_of(name) {
                Some(type_name) => json!({ "attached": true, "type": type_name }),
                None => json!({ "attached": false }),
            };
            (name.to_string(), slot)
        })
        .collect();

    json!({
        "request_id": ctx.request_id().to_string(),
        "slots": slots,
        "regions": {
            "DynamoDB": ctx.dynamodb().ok().map(|h| h.region().map(str::to_string)),
            "S3": ctx.s3().ok().map(|h| h.region().map(str::to_string)),
            "SecretsManager": ctx.secrets_manager().ok().map(|h| h.region().map(str::to_string)),
        },
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting aws-request-context CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let adapters = match cli.resolve().await {
        Ok(adapters) => adapters,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = adapters.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let pipeline = adapters.build_pipeline(
        "probe",
        handler_fn(|ctx, _req| {
            let body = serde_json::to_vec_pretty(&describe_context(ctx))?;
            http::Response::builder()
                .header("content-type", "application/json")
                .body(Bytes::from(body))
                .map_err(|e| AdapterError::handler(e.to_string()))
        }),
    );
    tracing::info!("🔗 Middleware chain: {:?}", pipeline.middleware_names());

    let request = http::Request::builder()
        .uri(cli.path.as_str())
        .body(Bytes::new())?;

    match pipeline.dispatch(request).await {
        Ok(response) => {
            println!("{}", String::from_utf8_lossy(response.body()));
        }
        Err(e) => {
            tracing::error!("❌ Request failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    }

    Ok(())
}
