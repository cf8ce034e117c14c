use std::collections::BTreeSet;

use {
    agenda_auth::{hash_password, mint_token, resolve_token, verify_password_or_dummy},
    agenda_common::{Entity, UserRole},
    agenda_config::AuthConfig,
    agenda_store::{NewCalendar, NewSchedule, NewUser, SqliteStore, StoreStats},
    chrono::{DateTime, NaiveDateTime, Timelike},
    secrecy::ExposeSecret,
    tracing::{debug, info, warn},
    uuid::Uuid,
};

use crate::{
    error::{Error, Result},
    policy::{self, Identity, Operation},
    types::{
        CalendarExistence, CalendarRequest, CalendarView, ExportStatistics, LoginOutcome,
        LoginRequest, ScheduleRequest, ScheduleView, SignupOutcome, SignupRequest,
        UserExistence, UserExport,
    },
};

pub const DEFAULT_CALENDAR_NAME: &str = "My Calendar";
pub const DEFAULT_CALENDAR_DESCRIPTION: &str = "Default calendar";
pub const DEFAULT_IMPORTANCE: u8 = 5;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Code of the calendar every user gets at signup.
pub fn default_calendar_code(user_id: &str) -> String {
    format!("{user_id}_default")
}

/// Users, calendars and schedules behind the access policy.
#[derive(Clone)]
pub struct SchedulingService {
    store: SqliteStore,
    auth: AuthConfig,
}

impl SchedulingService {
    pub fn new(store: SqliteStore, auth: AuthConfig) -> Self {
        Self { store, auth }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    // ── Accounts ─────────────────────────────────────────────────────────

    /// Register a user together with their default calendar.
    pub async fn signup(&self, req: SignupRequest) -> Result<SignupOutcome> {
        let user_id = required("user_id", req.user_id)?;
        let name = required("name", req.name)?;
        let email = required("email", req.email)?;
        if !email.contains('@') {
            return Err(Error::validation("email", "must be an email address"));
        }
        let password = req
            .password
            .ok_or_else(|| Error::validation("password", "is required"))?;
        if password.expose_secret().chars().count() < self.auth.min_password_len.max(1) {
            return Err(Error::validation(
                "password",
                format!(
                    "must be at least {} characters",
                    self.auth.min_password_len.max(1)
                ),
            ));
        }
        let role = match optional(req.user_type) {
            Some(raw) => raw
                .parse::<UserRole>()
                .map_err(|e| Error::validation("user_type", e.to_string()))?,
            None => UserRole::default(),
        };

        let password_hash = hash_password(password.expose_secret())?;
        let calendar = NewCalendar {
            code: default_calendar_code(&user_id),
            name: DEFAULT_CALENDAR_NAME.into(),
            description: Some(DEFAULT_CALENDAR_DESCRIPTION.into()),
        };
        let user = NewUser {
            user_id,
            name,
            email,
            password_hash,
            role,
            phone: optional(req.phone),
            profile: optional(req.profile),
        };

        let (user, calendar) = self.store.create_user_with_calendar(user, calendar).await?;
        info!(user_id = %user.user_id, calendar = %calendar.code, "user signed up");
        Ok(SignupOutcome {
            user: user.into(),
            default_calendar: calendar.into(),
        })
    }

    /// Check a password and mint a bearer token. Unknown users and wrong
    /// passwords fail identically.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome> {
        let user_id = required("user_id", req.user_id)?;
        let password = req
            .password
            .ok_or_else(|| Error::validation("password", "is required"))?;

        let user = self.store.user(&user_id).await?;
        let verified = verify_password_or_dummy(
            password.expose_secret(),
            user.as_ref().map(|u| u.password_hash.as_str()),
        );
        let user = match user {
            Some(user) if verified => user,
            _ => {
                warn!(user_id = %user_id, "login failed");
                return Err(Error::Unauthorized);
            },
        };

        info!(user_id = %user.user_id, "user logged in");
        Ok(LoginOutcome {
            token: mint_token(&user.user_id),
            user: user.into(),
        })
    }

    /// Resolve a bearer token to an existing user.
    pub async fn resolve_identity(&self, token: &str) -> Result<Identity> {
        let user_id = resolve_token(token)?;
        let user = self.store.user(&user_id).await?.ok_or_else(|| {
            debug!(user_id = %user_id, "token names an unknown user");
            Error::Unauthorized
        })?;
        Ok(Identity {
            user_id: user.user_id,
            name: user.name,
        })
    }

    /// Like [`Self::resolve_identity`], but an absent or unusable token is
    /// simply no identity. Store failures still surface.
    pub async fn identify(&self, token: Option<&str>) -> Result<Option<Identity>> {
        let Some(token) = token else {
            return Ok(None);
        };
        match self.resolve_identity(token).await {
            Ok(identity) => Ok(Some(identity)),
            Err(Error::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn user_exists(&self, user_id: &str) -> Result<UserExistence> {
        let user = self.store.user(user_id).await?;
        Ok(UserExistence {
            exists: user.is_some(),
            user_id: user_id.to_string(),
            name: user.map(|u| u.name),
        })
    }

    /// Delete the caller's own account with all its calendars and schedules.
    pub async fn delete_user(&self, caller: Option<&Identity>, user_id: &str) -> Result<()> {
        policy::enforce(caller, Operation::DeleteUser, Some(user_id))?;
        self.store.delete_user(user_id).await?;
        info!(user_id, "user deleted");
        Ok(())
    }

    // ── Calendars ────────────────────────────────────────────────────────

    pub async fn create_calendar(
        &self,
        caller: Option<&Identity>,
        req: CalendarRequest,
    ) -> Result<CalendarView> {
        policy::enforce(caller, Operation::CreateCalendar, None)?;
        let identity = policy::authenticate(caller)?;
        let name = required("name", req.name)?;

        let calendar = NewCalendar {
            code: format!("{}_{}", identity.user_id, Uuid::new_v4().simple()),
            name,
            description: optional(req.description),
        };
        let created = self.store.create_calendar(&identity.user_id, calendar).await?;
        info!(calendar = %created.code, owner = %identity.user_id, "calendar created");
        Ok(created.into())
    }

    /// The caller's own calendars.
    pub async fn list_calendars(&self, caller: Option<&Identity>) -> Result<Vec<CalendarView>> {
        policy::enforce(caller, Operation::ListCalendars, None)?;
        let identity = policy::authenticate(caller)?;
        let calendars = self.store.calendars_owned_by(&identity.user_id).await?;
        Ok(calendars.into_iter().map(Into::into).collect())
    }

    pub async fn calendar_exists(&self, code: &str) -> Result<CalendarExistence> {
        let calendar = self.store.calendar(code).await?;
        Ok(CalendarExistence {
            exists: calendar.is_some(),
            calendar_code: code.to_string(),
            calendar_name: calendar.as_ref().map(|c| c.name.clone()),
            owner_id: calendar.map(|c| c.owner.user_id),
        })
    }

    /// Delete one of the caller's calendars and every schedule in it.
    pub async fn delete_calendar(&self, caller: Option<&Identity>, code: &str) -> Result<()> {
        policy::authenticate(caller)?;
        let calendar = self
            .store
            .calendar(code)
            .await?
            .ok_or(Error::NotFound(Entity::Calendar))?;
        policy::enforce(
            caller,
            Operation::DeleteCalendar,
            Some(calendar.owner.user_id.as_str()),
        )?;
        self.store.delete_calendar(code).await?;
        info!(calendar = code, "calendar deleted");
        Ok(())
    }

    // ── Schedules ────────────────────────────────────────────────────────

    /// Add a schedule to a calendar the caller owns.
    pub async fn create_schedule(
        &self,
        caller: Option<&Identity>,
        calendar_code: &str,
        req: ScheduleRequest,
    ) -> Result<ScheduleView> {
        let identity = policy::authenticate(caller)?;
        let calendar = self
            .store
            .calendar(calendar_code)
            .await?
            .ok_or(Error::NotFound(Entity::Calendar))?;
        policy::enforce(
            caller,
            Operation::CreateSchedule,
            Some(calendar.owner.user_id.as_str()),
        )?;

        let schedule = build_schedule(&identity.user_id, req)?;
        let created = self.store.create_schedule(calendar_code, schedule).await?;
        info!(
            schedule = %created.schedule_id,
            calendar = calendar_code,
            owner = %identity.user_id,
            "schedule created"
        );
        Ok(ScheduleView::new(created, Some(identity.user_id.as_str())))
    }

    /// Every schedule in a calendar, whoever owns it.
    pub async fn list_schedules_for_calendar(
        &self,
        caller: Option<&Identity>,
        calendar_code: &str,
    ) -> Result<Vec<ScheduleView>> {
        policy::enforce(caller, Operation::ListCalendarSchedules, None)?;
        let identity = policy::authenticate(caller)?;
        if self.store.calendar(calendar_code).await?.is_none() {
            return Err(Error::NotFound(Entity::Calendar));
        }
        let schedules = self.store.schedules_in_calendar(calendar_code).await?;
        Ok(schedules
            .into_iter()
            .map(|s| ScheduleView::new(s, Some(identity.user_id.as_str())))
            .collect())
    }

    /// The schedule feed for `user_id`: every schedule in every calendar,
    /// flagged with whether `user_id` owns it.
    pub async fn list_schedules_for_user(
        &self,
        caller: Option<&Identity>,
        user_id: &str,
    ) -> Result<Vec<ScheduleView>> {
        policy::enforce(caller, Operation::ListUserSchedules, Some(user_id))?;
        if self.store.user(user_id).await?.is_none() {
            return Err(Error::NotFound(Entity::User));
        }
        let schedules = self.store.all_schedules().await?;
        debug!(user_id, count = schedules.len(), "listed schedule feed");
        Ok(schedules
            .into_iter()
            .map(|s| ScheduleView::new(s, Some(user_id)))
            .collect())
    }

    /// One user's own data: profile, calendars and only the schedules in
    /// those calendars. Schedules are flagged relative to the caller.
    pub async fn export_user(&self, caller: Option<&Identity>, user_id: &str) -> Result<UserExport> {
        policy::enforce(caller, Operation::ExportUser, Some(user_id))?;
        let identity = policy::authenticate(caller)?;
        let user = self
            .store
            .user(user_id)
            .await?
            .ok_or(Error::NotFound(Entity::User))?;
        let calendars = self.store.calendars_owned_by(user_id).await?;
        let schedules = self.store.schedules_owned_by(user_id).await?;
        debug!(
            user_id,
            calendars = calendars.len(),
            schedules = schedules.len(),
            "exported user data"
        );
        Ok(UserExport {
            user_info: user.into(),
            statistics: ExportStatistics {
                calendars_count: calendars.len(),
                schedules_count: schedules.len(),
            },
            calendars: calendars.into_iter().map(CalendarView::from).collect(),
            schedules: schedules
                .into_iter()
                .map(|s| ScheduleView::new(s, Some(identity.user_id.as_str())))
                .collect(),
        })
    }

    /// Fetch one schedule. Open to anyone who knows the id.
    pub async fn get_schedule(
        &self,
        caller: Option<&Identity>,
        schedule_id: &str,
    ) -> Result<ScheduleView> {
        policy::enforce(caller, Operation::ReadSchedule, None)?;
        let schedule = self
            .store
            .schedule(schedule_id)
            .await?
            .ok_or(Error::NotFound(Entity::Schedule))?;
        Ok(ScheduleView::new(
            schedule,
            caller.map(|c| c.user_id.as_str()),
        ))
    }

    pub async fn delete_schedule(&self, caller: Option<&Identity>, schedule_id: &str) -> Result<()> {
        policy::authenticate(caller)?;
        let schedule = self
            .store
            .schedule(schedule_id)
            .await?
            .ok_or(Error::NotFound(Entity::Schedule))?;
        policy::enforce(
            caller,
            Operation::DeleteSchedule,
            Some(schedule.owner.user_id.as_str()),
        )?;
        self.store.delete_schedule(schedule_id).await?;
        info!(schedule = schedule_id, "schedule deleted");
        Ok(())
    }

    // ── Housekeeping ─────────────────────────────────────────────────────

    pub async fn summary(&self) -> Result<StoreStats> {
        Ok(self.store.stats().await?)
    }

    pub async fn health(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }
}

// ── Input helpers ───────────────────────────────────────────────────────────

/// A trimmed, non-empty value or a validation error naming `field`.
fn required(field: &str, value: Option<String>) -> Result<String> {
    optional(value).ok_or_else(|| Error::validation(field, "is required"))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an ISO 8601 date-time. Instants with an offset keep their local
/// wall-clock reading. Fractional seconds are dropped since times are
/// stored at whole-second precision.
fn parse_datetime(field: &str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.naive_local()),
        Err(_) => NAIVE_DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok()),
    };
    parsed
        .map(|dt| dt.with_nanosecond(0).unwrap_or(dt))
        .ok_or_else(|| Error::validation(field, "must be an ISO 8601 date-time"))
}

fn build_schedule(owner_id: &str, req: ScheduleRequest) -> Result<NewSchedule> {
    let title = required("title", req.title)?;
    let start = parse_datetime("startTime", &required("startTime", req.start_time)?)?;
    let end = parse_datetime("endTime", &required("endTime", req.end_time)?)?;
    if end.date() != start.date() {
        return Err(Error::validation("endTime", "must be on the same day as startTime"));
    }
    if end <= start {
        return Err(Error::validation("endTime", "must be after startTime"));
    }

    let importance = match req.importance {
        None => DEFAULT_IMPORTANCE,
        Some(value) => u8::try_from(value)
            .ok()
            .filter(|v| (1..=10).contains(v))
            .ok_or_else(|| Error::validation("importance", "must be between 1 and 10"))?,
    };

    let tags: BTreeSet<String> = req
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    Ok(NewSchedule {
        schedule_id: format!("schedule_{owner_id}_{}", Uuid::new_v4().simple()),
        date: start.date(),
        start: start.time(),
        end: end.time(),
        title,
        description: optional(req.description),
        location: req.location.and_then(|l| l.into_location()),
        participants: req.participants,
        estimated_cost: req.estimated_cost,
        tags,
        importance,
        notes: optional(req.notes),
    })
}
