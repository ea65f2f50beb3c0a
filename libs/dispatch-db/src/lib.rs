pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::{StoreError, StoreResult};
pub use repositories::{OrderStore, PaymentStore, UserStore};
pub use sqlx;
