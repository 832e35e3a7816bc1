// Lifecycle engine — staging, session bookkeeping, packaging, purge.

pub mod expiry;
pub mod packaging;
pub mod purge;
pub mod session;
pub mod staging;
