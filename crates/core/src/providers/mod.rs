pub mod registry;
pub mod static_source;
pub mod traits;
