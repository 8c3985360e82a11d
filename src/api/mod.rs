pub mod handlers;
pub mod response;
mod router;

pub use router::build_router;
