//! Core conversion orchestration: registry, dispatch, configuration.

pub mod config;
pub mod dispatch;
pub mod registry;
