//! Application services and ports.

#![forbid(unsafe_code)]

mod sweep_ports;
mod sweep_scheduler;
mod sweep_service;

pub use sweep_ports::{RecurrenceSchedule, RecycleBinGateway, StorageGateway, SweepRunner};
pub use sweep_scheduler::{MAX_POLL_INTERVAL, SchedulerState, SweepScheduler};
pub use sweep_service::SweepService;
