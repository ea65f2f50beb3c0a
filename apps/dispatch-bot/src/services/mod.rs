pub mod pay_service;
pub mod payment_poller;
pub mod store_service;
