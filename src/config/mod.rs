pub mod binding_config;
