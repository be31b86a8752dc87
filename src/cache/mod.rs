pub mod stored_token;
pub mod token_cache;
