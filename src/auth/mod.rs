pub mod authenticator;
pub mod error;
