pub mod gateway;
pub mod loader;
