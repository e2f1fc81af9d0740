//! Platform backends behind the agent tools.

pub mod http;
pub mod in_memory;

pub use http::HttpPlatformClient;
pub use in_memory::InMemoryPlatform;
