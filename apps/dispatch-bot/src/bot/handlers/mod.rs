pub mod callback;
pub mod command;
pub mod message;
pub mod payment;
