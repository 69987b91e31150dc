//! HTTP handlers for the todo board API.

pub mod columns;
pub mod photos;
pub mod todos;
