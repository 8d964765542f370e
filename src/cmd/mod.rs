pub mod solve;
pub mod validate;
