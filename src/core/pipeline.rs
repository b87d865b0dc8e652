use crate::core::context::RequestContext;
use crate::domain::model::{Request, Response};
use crate::domain::ports::{Handler, Middleware};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;

/// 呼叫剩餘的 middleware 鏈；只能使用一次
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(chain: &'a [Arc<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Self { chain, handler }
    }

    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Result<Response> {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                tracing::trace!("➡️ entering middleware '{}'", middleware.name());
                let next = Next::new(rest, self.handler);
                middleware.handle(ctx, request, next).await
            }
            None => self.handler.call(ctx, request).await,
        }
    }
}

/// 一條路由的處理鏈：依註冊順序執行 middleware，最後交給 handler
pub struct Pipeline {
    name: String,
    middlewares: Vec<Arc<dyn Middleware>>,
    handler: Box<dyn Handler>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        Self {
            name: name.into(),
            middlewares: Vec::new(),
            handler: Box::new(handler),
        }
    }

    /// 加入一個 middleware（依加入順序執行）
    pub fn add_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middlewares.push(Arc::new(middleware));
    }

    pub fn with_middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.add_middleware(middleware);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// 以全新的 context 處理一個請求
    pub async fn dispatch(&self, request: Request) -> Result<Response> {
        let mut ctx = RequestContext::new();
        self.run(&mut ctx, request).await
    }

    /// 以呼叫端提供的 context 處理請求；結束後呼叫端仍可檢查 context
    pub async fn run(&self, ctx: &mut RequestContext, request: Request) -> Result<Response> {
        let span = tracing::info_span!(
            "request",
            pipeline = %self.name,
            request_id = %ctx.request_id(),
            method = %request.method(),
            path = %request.uri().path(),
        );

        async {
            tracing::debug!("📥 dispatching through {} middleware", self.middlewares.len());
            let outcome = Next::new(&self.middlewares, self.handler.as_ref())
                .run(ctx, request)
                .await;

            match &outcome {
                Ok(response) => tracing::debug!("📤 completed with status {}", response.status()),
                Err(e) => tracing::warn!("❌ request failed: {}", e),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

/// 以同步閉包當作 handler
pub struct HandlerFn<F> {
    func: F,
}

pub fn handler_fn<F>(func: F) -> HandlerFn<F>
where
    F: Fn(&RequestContext, Request) -> Result<Response> + Send + Sync,
{
    HandlerFn { func }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(&RequestContext, Request) -> Result<Response> + Send + Sync,
{
    async fn call(&self, ctx: &RequestContext, request: Request) -> Result<Response> {
        (self.func)(ctx, request)
    }
}
