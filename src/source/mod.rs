pub mod binding_source;
pub mod navigator;
pub mod snapshot;
