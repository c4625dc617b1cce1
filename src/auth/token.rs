//! Token secrets and the per-session token record.

pub mod record;
pub mod secret;
