//! The synchronizer: keeps the cache's rows in lockstep with the source
//! tree, one release directory at a time.

mod release_sync;
mod sweep;

pub use release_sync::sync_release;
pub use sweep::sweep_all;
