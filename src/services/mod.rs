pub mod flight_status;
pub mod inventory;
pub mod notify;
pub mod order;
pub mod reschedule;
pub mod settings;
pub mod ticket;
pub mod timeout;
