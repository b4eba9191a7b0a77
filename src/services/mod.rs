pub mod batches;
pub mod builder;
pub mod dataset;
pub mod encoding;
pub mod ids;
pub mod pipeline;
pub mod summary;
pub mod validate;
pub mod voices;
