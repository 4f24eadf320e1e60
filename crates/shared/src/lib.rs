//! Shared utilities and common types for the Geo Registry backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Coordinate validation logic
//! - Length limits shared by request validation and the database schema

pub mod validation;
