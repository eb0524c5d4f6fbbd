pub mod binder;
pub mod bound_model;
pub mod error;
pub mod page_binder;
