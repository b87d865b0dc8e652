use crate::config::BackendConfig;
use crate::core::context::RequestContext;
use crate::core::pipeline::Next;
use crate::domain::model::{Request, ResourceKey, Response};
use crate::utils::error::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;

/// Pipeline 中的一個階段
///
/// 實作必須把 `next` 的結果原封不動往回傳，不吞掉也不包裝下游的錯誤。
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        ctx: &mut RequestContext,
        request: Request,
        next: Next<'_>,
    ) -> Result<Response>;
}

/// Pipeline 的終點；此時 context 已經填好，只能讀
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, ctx: &RequestContext, request: Request) -> Result<Response>;
}

/// 一個外部後端服務：怎麼從設定建立兩種 handle，以及它們掛在 context 的名稱
pub trait Backend: Send + Sync + 'static {
    /// 高階、一次呼叫就完成操作的 handle
    type Handle: Send + Sync + 'static;
    /// SDK 原生的低階 client
    type Client: Send + Sync + 'static;

    const SERVICE: &'static str;
    const HANDLE: ResourceKey<Self::Handle>;
    const CLIENT: ResourceKey<Self::Client>;

    /// 以已解析的 `SdkConfig` 建立兩個 handle；只做本地物件建構，不能有 I/O
    fn connect(sdk: &SdkConfig, config: &BackendConfig) -> (Self::Handle, Self::Client);

    /// 下游完成後釋放 handle。SDK client 沒有明確的 close，drop 就會放掉連線與計時器。
    fn release(handle: Self::Handle, client: Self::Client) {
        drop(handle);
        drop(client);
    }
}
