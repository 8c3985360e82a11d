mod diag;
mod purge_expired;

pub use diag::print_diagnostics_task;
pub use purge_expired::purge_expired_task;
