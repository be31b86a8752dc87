pub mod common;
pub mod expiration_and_cache;
pub mod token_server;
