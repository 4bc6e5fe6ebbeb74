pub mod auth;
pub mod classify;
pub mod gallery;
pub mod upload;
