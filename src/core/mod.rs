pub mod adapter;
pub mod context;
pub mod contract;
pub mod pipeline;

pub use crate::domain::model::{Request, ResourceKey, Response};
pub use crate::domain::ports::{Backend, Handler, Middleware};
pub use crate::utils::error::Result;
pub use adapter::ResourceAdapter;
pub use context::RequestContext;
pub use contract::{AwsContext, DynamoDbContext, S3Context, SecretsManagerContext};
pub use pipeline::{handler_fn, HandlerFn, Next, Pipeline};
