//! Bookstore application library
//!
//! Feature modules and the bootstrap used by the `bookstore-app` and
//! `bookstore` binaries.

pub mod app;
pub mod modules;

pub use app::{build_registry, prepare_database, serve};
