pub mod admin;
pub mod auth;
pub mod flight;
pub mod order;
pub mod reschedule;
pub mod ticket;
