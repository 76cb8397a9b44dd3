//! Operator accounts: registration, login and bearer-token verification.
//!
//! Three layers: `domain` types, a `repository` trait with a SeaORM and an
//! in-memory implementation, and the framework-free `service`.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{decode_token, AuthService, Claims};
