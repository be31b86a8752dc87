pub mod actor;
pub mod registry;
pub mod service;
pub mod validator;
