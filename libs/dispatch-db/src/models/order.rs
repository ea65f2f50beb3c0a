use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The four progressively filled fields, in fill order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    Source,
    Time,
    Destination,
    Phone,
}

impl OrderField {
    pub const ALL: [OrderField; 4] = [
        OrderField::Source,
        OrderField::Time,
        OrderField::Destination,
        OrderField::Phone,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            OrderField::Source => "source",
            OrderField::Time => "time",
            OrderField::Destination => "destination",
            OrderField::Phone => "phone",
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Conversation stage of an order, derived from which fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillState {
    AwaitingSource,
    AwaitingTime,
    AwaitingDestination,
    AwaitingPhone,
    Complete,
}

impl FillState {
    pub fn next_field(&self) -> Option<OrderField> {
        match self {
            FillState::AwaitingSource => Some(OrderField::Source),
            FillState::AwaitingTime => Some(OrderField::Time),
            FillState::AwaitingDestination => Some(OrderField::Destination),
            FillState::AwaitingPhone => Some(OrderField::Phone),
            FillState::Complete => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub telegram_id: Option<i64>,
    pub source: Option<String>,
    pub time: Option<String>,
    pub destination: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fully filled order coming from the external intake channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OrderDraft {
    pub source: String,
    pub destination: String,
    pub time: String,
    pub phone: String,
}

impl Order {
    pub fn field(&self, field: OrderField) -> Option<&str> {
        match field {
            OrderField::Source => self.source.as_deref(),
            OrderField::Time => self.time.as_deref(),
            OrderField::Destination => self.destination.as_deref(),
            OrderField::Phone => self.phone.as_deref(),
        }
    }

    /// The first absent field wins. A later field being present while an
    /// earlier one is absent is rejected by the store, so it is not handled here.
    pub fn fill_state(&self) -> FillState {
        if self.source.is_none() {
            FillState::AwaitingSource
        } else if self.time.is_none() {
            FillState::AwaitingTime
        } else if self.destination.is_none() {
            FillState::AwaitingDestination
        } else if self.phone.is_none() {
            FillState::AwaitingPhone
        } else {
            FillState::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fill_state() == FillState::Complete
    }

    /// Chat to notify about this order. Intake orders have none.
    pub fn customer_chat(&self) -> Option<i64> {
        self.telegram_id.filter(|id| *id != 0)
    }

    pub fn code(&self, prefix: &str) -> String {
        format!("{}-{:04}", prefix, self.id)
    }

    /// Summary posted to the shared driver channel. Leaves the phone out.
    pub fn to_driver_chat(&self, prefix: &str) -> String {
        format!(
            "ID: {}\nFrom: {}\nTo: {}\nTime: {}",
            self.code(prefix),
            self.source.as_deref().unwrap_or("-"),
            self.destination.as_deref().unwrap_or("-"),
            self.time.as_deref().unwrap_or("-"),
        )
    }

    /// Summary sent privately to the driver who took the order.
    pub fn to_private(&self, prefix: &str) -> String {
        format!(
            "{}\nPhone: {}",
            self.to_driver_chat(prefix),
            self.phone.as_deref().unwrap_or("-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_order() -> Order {
        Order {
            id: 7,
            user_id: Some(Uuid::new_v4()),
            telegram_id: Some(42),
            source: None,
            time: None,
            destination: None,
            phone: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn fill_state_follows_field_order() {
        let mut order = empty_order();
        assert_eq!(order.fill_state(), FillState::AwaitingSource);

        order.source = Some("123 Main St".into());
        assert_eq!(order.fill_state(), FillState::AwaitingTime);

        order.time = Some("14:00".into());
        assert_eq!(order.fill_state(), FillState::AwaitingDestination);

        order.destination = Some("456 Oak Ave".into());
        assert_eq!(order.fill_state(), FillState::AwaitingPhone);
        assert_eq!(order.fill_state().next_field(), Some(OrderField::Phone));

        order.phone = Some("+15551234567".into());
        assert!(order.is_complete());
        assert_eq!(order.fill_state().next_field(), None);
    }

    #[test]
    fn driver_chat_summary_hides_phone() {
        let mut order = empty_order();
        order.source = Some("123 Main St".into());
        order.time = Some("14:00".into());
        order.destination = Some("456 Oak Ave".into());
        order.phone = Some("+15551234567".into());

        let public = order.to_driver_chat("MOSCOW");
        assert!(public.starts_with("ID: MOSCOW-0007"));
        assert!(public.contains("From: 123 Main St"));
        assert!(public.contains("To: 456 Oak Ave"));
        assert!(!public.contains("+15551234567"));

        let private = order.to_private("MOSCOW");
        assert!(private.contains("Phone: +15551234567"));
    }

    #[test]
    fn zero_chat_id_means_no_customer() {
        let mut order = empty_order();
        order.telegram_id = Some(0);
        assert_eq!(order.customer_chat(), None);
        order.telegram_id = None;
        assert_eq!(order.customer_chat(), None);
    }
}
