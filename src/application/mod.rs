//! Application layer: wiring configuration into a running assistant.

pub mod runtime;

pub use runtime::{
    backends_from_config, embedder_from_config, index_service_from_config, load_retriever,
    model_from_config, AssistantRuntime,
};
