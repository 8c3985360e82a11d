#![allow(dead_code)]

pub mod fake_cache;
pub mod fake_provider;
