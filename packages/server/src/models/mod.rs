pub mod gallery;
pub mod outcome;
pub mod upload;
pub mod user;
