//! Tasklist server library.
//!
//! Exposes the record store, task repository, and HTTP resource layer for
//! use in tests and embedding. The binary wires them together from a
//! resolved [`config::ServerConfig`].

pub mod api;
pub mod auth;
pub mod config;
pub mod repository;
pub mod store;
