//! API handlers

pub mod auth;
pub mod fare;
pub mod health;
pub mod hidden_gems;
