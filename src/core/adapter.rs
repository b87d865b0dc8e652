use crate::config::BackendConfig;
use crate::core::context::RequestContext;
use crate::core::pipeline::Next;
use crate::domain::model::{Request, Response};
use crate::domain::ports::{Backend, Middleware};
use crate::utils::error::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// 把某個後端的兩個 handle 掛到每個請求的 context 上
///
/// 設定在建立 adapter 時就固定下來；handle 則每個請求重新建立，下游結束後
/// （不論成功或失敗）都會收回並釋放。若請求在等待下游時被取消，handle 仍由
/// context 持有，隨 context 一起 drop。
///
/// 環境預設值（region、憑證鏈）只在第一個請求時解析一次，之後每個請求都從
/// 同一份 `SdkConfig` 建立 handle，不再有 I/O。
pub struct ResourceAdapter<B: Backend> {
    config: Arc<BackendConfig>,
    sdk: Arc<OnceCell<SdkConfig>>,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> ResourceAdapter<B> {
    pub fn new(config: impl Into<Option<BackendConfig>>) -> Self {
        Self {
            config: Arc::new(config.into().unwrap_or_default()),
            sdk: Arc::new(OnceCell::new()),
            _backend: PhantomData,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// 已解析的共用設定；第一次呼叫時才載入
    pub async fn sdk_config(&self) -> &SdkConfig {
        self.sdk
            .get_or_init(|| async {
                tracing::debug!("🌐 {}: resolving SDK configuration", B::SERVICE);
                self.config.load_sdk_config().await
            })
            .await
    }
}

impl<B: Backend> Default for ResourceAdapter<B> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<B: Backend> Clone for ResourceAdapter<B> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            sdk: Arc::clone(&self.sdk),
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> fmt::Debug for ResourceAdapter<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceAdapter")
            .field("service", &B::SERVICE)
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl<B: Backend> Middleware for ResourceAdapter<B> {
    fn name(&self) -> &'static str {
        B::SERVICE
    }

    async fn handle(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        next: Next<'_>,
    ) -> Result<Response> {
        let sdk = self.sdk_config().await;
        let (handle, client) = B::connect(sdk, &self.config);
        let shadowed_handle = ctx.insert(B::HANDLE, handle);
        let shadowed_client = ctx.insert(B::CLIENT, client);
        tracing::debug!(
            "🔌 {}: attached '{}' and '{}'",
            B::SERVICE,
            B::HANDLE,
            B::CLIENT
        );

        let outcome = next.run(ctx, request).await;

        let handle = ctx.withdraw(B::HANDLE, shadowed_handle);
        let client = ctx.withdraw(B::CLIENT, shadowed_client);
        match (handle, client) {
            (Some(handle), Some(client)) => {
                B::release(handle, client);
                tracing::debug!("🔌 {}: released handles", B::SERVICE);
            }
            _ => tracing::warn!(
                "🔶 {}: handles were missing from the context at release time",
                B::SERVICE
            ),
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{handler_fn, Pipeline};
    use crate::domain::model::ResourceKey;
    use crate::utils::error::AdapterError;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONNECTS: AtomicUsize = AtomicUsize::new(0);
    static RELEASES: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Clone, PartialEq)]
    struct FakeHandle {
        region: Option<String>,
        serial: usize,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct FakeClient {
        region: Option<String>,
    }

    struct FakeBackend;

    impl Backend for FakeBackend {
        type Handle = FakeHandle;
        type Client = FakeClient;

        const SERVICE: &'static str = "Fake";
        const HANDLE: ResourceKey<FakeHandle> = ResourceKey::new("Fake");
        const CLIENT: ResourceKey<FakeClient> = ResourceKey::new("FakeClient");

        fn connect(sdk: &SdkConfig, _config: &BackendConfig) -> (FakeHandle, FakeClient) {
            let serial = CONNECTS.fetch_add(1, Ordering::SeqCst);
            let region = sdk.region().map(|r| r.to_string());
            (
                FakeHandle {
                    region: region.clone(),
                    serial,
                },
                FakeClient { region },
            )
        }

        fn release(_handle: FakeHandle, _client: FakeClient) {
            RELEASES.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    // 這些測試共用計數器，所以全部放在同一個測試裡依序執行
    #[tokio::test]
    async fn test_fake_backend_lifecycle() {
        // 成功路徑：下游看得到兩個名稱，結束後釋放一次
        let adapter = ResourceAdapter::<FakeBackend>::new(BackendConfig::new().with_region("eu-west-1"));
        let pipeline = Pipeline::new(
            "fake",
            handler_fn(|ctx, _req| {
                let handle = ctx.require(FakeBackend::HANDLE)?;
                let client = ctx.require(FakeBackend::CLIENT)?;
                assert_eq!(handle.region.as_deref(), Some("eu-west-1"));
                assert_eq!(client.region.as_deref(), Some("eu-west-1"));
                Ok(http::Response::new(Bytes::from(handle.serial.to_string())))
            }),
        )
        .with_middleware(adapter.clone());

        let before = RELEASES.load(Ordering::SeqCst);
        let mut ctx = RequestContext::new();
        let first = pipeline.run(&mut ctx, request()).await.unwrap();
        assert!(ctx.is_empty());
        assert_eq!(RELEASES.load(Ordering::SeqCst), before + 1);

        // 每個請求都重新建立 handle
        let second = pipeline.dispatch(request()).await.unwrap();
        assert_ne!(first.body(), second.body());

        // 失敗路徑：錯誤原樣傳回，handle 仍被釋放
        let failing = Pipeline::new(
            "fake-failing",
            handler_fn(|_ctx, _req| Err(AdapterError::handler("nope"))),
        )
        .with_middleware(adapter.clone());

        let before = RELEASES.load(Ordering::SeqCst);
        let mut ctx = RequestContext::new();
        let err = failing.run(&mut ctx, request()).await.unwrap_err();
        assert!(matches!(err, AdapterError::Handler { .. }));
        assert!(ctx.get(FakeBackend::HANDLE).is_none());
        assert!(ctx.get(FakeBackend::CLIENT).is_none());
        assert_eq!(RELEASES.load(Ordering::SeqCst), before + 1);

        // 同一個 adapter 掛兩次：內層遮蔽外層，結束後還原
        let nested = Pipeline::new(
            "fake-nested",
            handler_fn(|ctx, _req| {
                let handle = ctx.require(FakeBackend::HANDLE)?;
                assert_eq!(handle.region.as_deref(), Some("us-east-2"));
                Ok(http::Response::new(Bytes::new()))
            }),
        )
        .with_middleware(adapter)
        .with_middleware(ResourceAdapter::<FakeBackend>::new(
            BackendConfig::new().with_region("us-east-2"),
        ));

        let before = RELEASES.load(Ordering::SeqCst);
        nested.dispatch(request()).await.unwrap();
        assert_eq!(RELEASES.load(Ordering::SeqCst), before + 2);
    }

    static DROPPED: AtomicUsize = AtomicUsize::new(0);

    /// drop 時計數的 handle
    struct Tracked;

    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPPED.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct TrackedBackend;

    impl Backend for TrackedBackend {
        type Handle = Tracked;
        type Client = Tracked;

        const SERVICE: &'static str = "Tracked";
        const HANDLE: ResourceKey<Tracked> = ResourceKey::new("Tracked");
        const CLIENT: ResourceKey<Tracked> = ResourceKey::new("TrackedClient");

        fn connect(_sdk: &SdkConfig, _config: &BackendConfig) -> (Tracked, Tracked) {
            (Tracked, Tracked)
        }
    }

    /// 永遠不會完成的 handler，用來模擬請求中途被取消
    struct Stalled;

    #[async_trait]
    impl crate::domain::ports::Handler for Stalled {
        async fn call(&self, ctx: &RequestContext, _request: Request) -> Result<Response> {
            assert!(ctx.contains("Tracked"));
            std::future::pending::<()>().await;
            Ok(http::Response::new(Bytes::new()))
        }
    }

    #[tokio::test]
    async fn test_cancelled_request_drops_handles_with_context() {
        let adapter =
            ResourceAdapter::<TrackedBackend>::new(BackendConfig::new().with_region("eu-west-1"));
        // 先解析好設定，timeout 只涵蓋等待下游的時間
        adapter.sdk_config().await;
        let pipeline = Pipeline::new("stalled", Stalled).with_middleware(adapter);

        let mut ctx = RequestContext::new();
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            pipeline.run(&mut ctx, request()),
        )
        .await;
        assert!(outcome.is_err());

        // 下游沒跑完，handle 還留在 context 裡
        assert_eq!(ctx.names(), vec!["Tracked", "TrackedClient"]);
        assert_eq!(DROPPED.load(Ordering::SeqCst), 0);

        drop(ctx);
        assert_eq!(DROPPED.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sdk_config_is_resolved_once_per_adapter() {
        let adapter = ResourceAdapter::<FakeBackend>::new(BackendConfig::new().with_region("sa-east-1"));
        let cloned = adapter.clone();

        let first = adapter.sdk_config().await;
        let second = cloned.sdk_config().await;
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.region().map(|r| r.to_string()).as_deref(), Some("sa-east-1"));
    }

    #[test]
    fn test_default_adapter_uses_empty_config() {
        let adapter = ResourceAdapter::<FakeBackend>::default();
        assert!(adapter.config().region().is_none());
        assert_eq!(adapter.name(), "Fake");
    }
}
