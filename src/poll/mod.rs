pub mod cycle_report;
pub mod poller;
