use std::collections::BTreeSet;

use {
    agenda_common::UserRole,
    chrono::{NaiveDate, NaiveTime},
    serde::{Deserialize, Serialize},
};

/// Fields for a user about to be inserted. The password must already be
/// hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub profile: Option<String>,
    /// RFC 3339, UTC.
    pub created_at: String,
}

/// Public identity of an owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewCalendar {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, alias = "relation", skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
}

/// A schedule entry about to be inserted. `start` and `end` are
/// times of day on `date`.
#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub schedule_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub participants: Vec<Participant>,
    pub estimated_cost: Option<i64>,
    pub tags: BTreeSet<String>,
    pub importance: u8,
    pub notes: Option<String>,
}

/// A stored schedule together with its calendar and the calendar's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub schedule_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub participants: Vec<Participant>,
    pub estimated_cost: Option<i64>,
    pub tags: BTreeSet<String>,
    pub importance: u8,
    pub notes: Option<String>,
    pub created_at: String,
    pub calendar_code: String,
    pub calendar_name: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub users: i64,
    pub calendars: i64,
    pub schedules: i64,
}
