pub mod chunk;
pub mod extract;
pub mod status;
pub mod validate;
