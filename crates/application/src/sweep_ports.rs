mod recycle_bin;
mod schedule;
mod storage;

pub use recycle_bin::RecycleBinGateway;
pub use schedule::{RecurrenceSchedule, SweepRunner};
pub use storage::StorageGateway;
