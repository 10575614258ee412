pub mod backfill_report;
pub mod date_runs;
pub mod reconciler;
