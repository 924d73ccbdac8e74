//! HTTP route handlers

pub mod game;
pub mod room;
pub mod status;
