//! Database entities, one module per table.

pub mod golf_course;
pub mod inventory_level;
pub mod job;
pub mod notification;
pub mod part;
pub mod parts_usage_log;
pub mod serial_history;
pub mod stock_transaction;
pub mod user;
pub mod vehicle;
