use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub email_verified: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Owner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::Owner => "owner",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "owner" => UserRole::Owner,
            _ => UserRole::Customer,
        }
    }
}

/// Identity attached to a booking request or cancellation. Supplied by the
/// caller; this service trusts it but does not issue credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Requester {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

impl Requester {
    pub fn is_owner(&self) -> bool {
        self.role == Some(UserRole::Owner)
    }
}
