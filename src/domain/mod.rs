// Domain layer: request/response model, resource keys and the ports the pipeline is built on.

pub mod model;
pub mod ports;
