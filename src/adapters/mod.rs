// Adapters layer: concrete implementations for external systems (storage, quotes, language model).

pub mod llm;
pub mod quotes;
pub mod storage;
