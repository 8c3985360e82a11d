mod geocode;

pub(crate) use geocode::{geocode, health, plain, refresh};

pub use geocode::address_param;
