pub mod flight;
pub mod order;
pub mod reschedule_log;
pub mod system_setting;
pub mod ticket;
pub mod user;
