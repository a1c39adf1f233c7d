pub mod batch;
pub mod calculate;
pub mod validate;
