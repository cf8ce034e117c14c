use std::collections::BTreeSet;

use {
    agenda_common::UserRole,
    agenda_store::{Calendar, Location, Participant, Schedule, User},
    chrono::{NaiveDate, NaiveDateTime, NaiveTime},
    secrecy::Secret,
    serde::{Deserialize, Serialize},
};

/// Display color for schedules the viewer owns.
pub const MY_SCHEDULE_COLOR: &str = "#667eea";
/// Display color for everyone else's schedules.
pub const OTHER_SCHEDULE_COLOR: &str = "#10b981";

// ── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<Secret<String>>,
    pub user_type: Option<String>,
    pub phone: Option<String>,
    pub profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub password: Option<Secret<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A location given either as a bare name or in full.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Name(String),
    Detailed(Location),
}

impl LocationInput {
    /// `None` when no usable name was given.
    pub fn into_location(self) -> Option<Location> {
        let location = match self {
            Self::Name(name) => Location {
                name,
                ..Location::default()
            },
            Self::Detailed(location) => location,
        };
        (!location.name.trim().is_empty()).then_some(location)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleRequest {
    pub title: Option<String>,
    #[serde(rename = "startTime", alias = "start_time")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime", alias = "end_time")]
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub location: Option<LocationInput>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub estimated_cost: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub importance: Option<i64>,
    pub notes: Option<String>,
}

// ── Views ───────────────────────────────────────────────────────────────────

/// Public fields of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserRole,
    pub phone: Option<String>,
    pub profile: Option<String>,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            user_type: user.role,
            phone: user.phone,
            profile: user.profile,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub calendar_code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub owner_id: String,
    pub owner_name: String,
}

impl From<Calendar> for CalendarView {
    fn from(calendar: Calendar) -> Self {
        Self {
            calendar_code: calendar.code,
            name: calendar.name,
            description: calendar.description,
            created_at: calendar.created_at,
            owner_id: calendar.owner.user_id,
            owner_name: calendar.owner.name,
        }
    }
}

/// A schedule as seen by one viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleView {
    pub schedule_id: String,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub location: Option<Location>,
    pub participants: Vec<Participant>,
    pub estimated_cost: Option<i64>,
    pub tags: BTreeSet<String>,
    pub importance: u8,
    pub notes: Option<String>,
    pub created_at: String,
    pub calendar_code: String,
    pub calendar_name: String,
    pub owner_id: String,
    pub owner_name: String,
    pub is_my_schedule: bool,
    pub color: &'static str,
}

impl ScheduleView {
    /// Annotate `schedule` relative to `viewer`. An anonymous viewer owns
    /// nothing.
    pub fn new(schedule: Schedule, viewer: Option<&str>) -> Self {
        let is_my_schedule = viewer == Some(schedule.owner.user_id.as_str());
        Self {
            start_datetime: schedule.date.and_time(schedule.start),
            end_datetime: schedule.date.and_time(schedule.end),
            schedule_id: schedule.schedule_id,
            title: schedule.title,
            description: schedule.description,
            date: schedule.date,
            start_time: schedule.start,
            end_time: schedule.end,
            location: schedule.location,
            participants: schedule.participants,
            estimated_cost: schedule.estimated_cost,
            tags: schedule.tags,
            importance: schedule.importance,
            notes: schedule.notes,
            created_at: schedule.created_at,
            calendar_code: schedule.calendar_code,
            calendar_name: schedule.calendar_name,
            owner_id: schedule.owner.user_id,
            owner_name: schedule.owner.name,
            is_my_schedule,
            color: if is_my_schedule {
                MY_SCHEDULE_COLOR
            } else {
                OTHER_SCHEDULE_COLOR
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupOutcome {
    pub user: UserView,
    pub default_calendar: CalendarView,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserView,
}

/// Everything one user owns: their calendars and the schedules in them.
#[derive(Debug, Clone, Serialize)]
pub struct UserExport {
    pub user_info: UserView,
    pub statistics: ExportStatistics,
    pub calendars: Vec<CalendarView>,
    pub schedules: Vec<ScheduleView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportStatistics {
    pub calendars_count: usize,
    pub schedules_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserExistence {
    pub exists: bool,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarExistence {
    pub exists: bool,
    pub calendar_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, agenda_store::Owner};

    fn schedule(owner: &str) -> Schedule {
        Schedule {
            schedule_id: "s1".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(9, 15, 0).unwrap(),
            title: "Standup".into(),
            description: None,
            location: None,
            participants: Vec::new(),
            estimated_cost: None,
            tags: BTreeSet::new(),
            importance: 5,
            notes: None,
            created_at: "2025-01-01T00:00:00Z".into(),
            calendar_code: "c1".into(),
            calendar_name: "Work".into(),
            owner: Owner {
                user_id: owner.into(),
                name: "Owner".into(),
            },
        }
    }

    #[test]
    fn view_flags_and_colors_by_viewer() {
        let mine = ScheduleView::new(schedule("u1"), Some("u1"));
        assert!(mine.is_my_schedule);
        assert_eq!(mine.color, MY_SCHEDULE_COLOR);

        let theirs = ScheduleView::new(schedule("u1"), Some("u2"));
        assert!(!theirs.is_my_schedule);
        assert_eq!(theirs.color, OTHER_SCHEDULE_COLOR);

        let anonymous = ScheduleView::new(schedule("u1"), None);
        assert!(!anonymous.is_my_schedule);
    }

    #[test]
    fn view_serializes_combined_datetimes() {
        let json = serde_json::to_value(ScheduleView::new(schedule("u1"), Some("u1"))).unwrap();
        assert_eq!(json["start_datetime"], "2025-01-01T09:00:00");
        assert_eq!(json["end_datetime"], "2025-01-01T09:15:00");
        assert_eq!(json["start_time"], "09:00:00");
        assert_eq!(json["owner_id"], "u1");
        assert_eq!(json["color"], MY_SCHEDULE_COLOR);
    }

    #[test]
    fn location_accepts_name_or_object() {
        let req: ScheduleRequest =
            serde_json::from_str(r#"{"title":"x","startTime":"a","location":"Office"}"#).unwrap();
        assert_eq!(req.start_time.as_deref(), Some("a"));
        assert_eq!(req.location.unwrap().into_location().unwrap().name, "Office");

        let req: ScheduleRequest = serde_json::from_str(
            r#"{"location":{"name":"ABC Corp","address":"456 Teheran-ro"},
                "participants":[{"name":"Kim","relation":"client"}]}"#,
        )
        .unwrap();
        let location = req.location.unwrap().into_location().unwrap();
        assert_eq!(location.address.as_deref(), Some("456 Teheran-ro"));
        assert_eq!(req.participants[0].relationship.as_deref(), Some("client"));

        assert!(LocationInput::Name("  ".into()).into_location().is_none());
    }

    #[test]
    fn user_view_omits_password_hash() {
        let view = UserView::from(User {
            user_id: "u1".into(),
            name: "U".into(),
            email: "u1@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: UserRole::Admin,
            phone: None,
            profile: None,
            created_at: "2025-01-01T00:00:00Z".into(),
        });
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains(r#""user_type":"admin""#));
    }
}
