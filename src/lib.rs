pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod domain;
pub mod provider;
pub mod scheduler;
pub mod services;
pub mod tasks;
