//! API endpoint handlers.

pub mod feedback;
pub mod health;
pub mod predict;
pub mod reports;
pub mod web;
