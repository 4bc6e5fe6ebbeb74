//! Typed data access, one module per entity.
//!
//! Functions take any `ConnectionTrait` so they run equally on the pool or
//! inside a transaction.

pub mod comment;
pub mod image;
pub mod session;
pub mod user;
