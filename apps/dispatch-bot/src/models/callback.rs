use std::fmt;
use thiserror::Error;

pub const CREATE_ORDER_TAG: &str = "createOrder";
pub const CLAIM_TAG: &str = "order";
pub const ARRIVED_TAG: &str = "arrived";
pub const FINISHED_TAG: &str = "finished";

const DELIMITER: char = ':';

/// Action carried in an inline button payload as `<tag>:<order id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    CreateOrder,
    Claim(i64),
    Arrived(i64),
    Finished(i64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    #[error("unknown callback action `{0}`")]
    UnknownAction(String),
    #[error("callback `{0}` has no valid order id")]
    MalformedOrderId(String),
}

impl CallbackAction {
    pub fn to_payload(&self) -> String {
        self.to_string()
    }

    pub fn parse(payload: &str) -> Result<Self, CallbackParseError> {
        let mut parts = payload.split(DELIMITER);
        let tag = parts.next().unwrap_or_default();
        let mut order_id = || {
            parts
                .next()
                .and_then(|id| id.trim().parse::<i64>().ok())
                .ok_or_else(|| CallbackParseError::MalformedOrderId(payload.to_string()))
        };

        match tag {
            CREATE_ORDER_TAG => Ok(CallbackAction::CreateOrder),
            CLAIM_TAG => Ok(CallbackAction::Claim(order_id()?)),
            ARRIVED_TAG => Ok(CallbackAction::Arrived(order_id()?)),
            FINISHED_TAG => Ok(CallbackAction::Finished(order_id()?)),
            other => Err(CallbackParseError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::CreateOrder => f.write_str(CREATE_ORDER_TAG),
            CallbackAction::Claim(id) => write!(f, "{}{}{}", CLAIM_TAG, DELIMITER, id),
            CallbackAction::Arrived(id) => write!(f, "{}{}{}", ARRIVED_TAG, DELIMITER, id),
            CallbackAction::Finished(id) => write!(f, "{}{}{}", FINISHED_TAG, DELIMITER, id),
        }
    }
}
