// Domain layer: data model and ports (interfaces) for the external service and output sink.

pub mod model;
pub mod ports;
