//! Shared definitions for the tasklist JSON wire format.

pub mod task;
