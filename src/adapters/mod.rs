// Adapters layer: concrete implementations for the data service and output storage.

pub mod cache;
pub mod http;
pub mod storage;
