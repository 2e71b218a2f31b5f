pub mod cache;
#[allow(clippy::module_inception)]
pub mod db;
pub mod reportdb;
pub mod stationdb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

pub use db::DBClient;

use reportdb::ReportExt;
use stationdb::StationExt;
use userdb::UserExt;

/// Everything the handlers need from persistence, as one object-safe trait
/// so `AppState` can hold an `Arc<dyn Store>`.
pub trait Store: UserExt + ReportExt + StationExt + Send + Sync {}

impl<T> Store for T where T: UserExt + ReportExt + StationExt + Send + Sync {}
