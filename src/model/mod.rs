pub mod batch;
pub mod category;
pub mod passage;
pub mod vocabulary;
