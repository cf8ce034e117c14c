use {
    agenda_common::Entity,
    chrono::{NaiveDate, NaiveTime},
    sqlx::{SqliteConnection, SqlitePool},
    tracing::debug,
};

use crate::{
    error::{Context, Error, Result},
    types::{
        Calendar, NewCalendar, NewSchedule, NewUser, Owner, Schedule, StoreStats, User,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const SELECT_USER: &str = "SELECT user_id, name, email, password_hash, user_type, phone, profile,
        strftime('%Y-%m-%dT%H:%M:%SZ', created_at) AS created_at
    FROM users";

const SELECT_CALENDAR: &str = "SELECT c.calendar_code, c.name, c.description,
        strftime('%Y-%m-%dT%H:%M:%SZ', c.created_at) AS created_at,
        u.user_id AS owner_id, u.name AS owner_name
    FROM calendars c
    JOIN users u ON u.id = c.owner_id";

const SELECT_SCHEDULE: &str = "SELECT s.schedule_id, s.date, s.start_time, s.end_time, s.title,
        s.description, s.location, s.participants, s.estimated_cost, s.tags, s.importance,
        s.notes, strftime('%Y-%m-%dT%H:%M:%SZ', s.created_at) AS created_at,
        c.calendar_code, c.name AS calendar_name,
        u.user_id AS owner_id, u.name AS owner_name
    FROM schedules s
    JOIN calendars c ON c.id = s.calendar_id
    JOIN users u ON u.id = c.owner_id";

const SCHEDULE_ORDER: &str = "ORDER BY s.date, s.start_time, s.id";

/// SQLite-backed store for users, calendars and schedules.
///
/// Every mutating method runs in a single transaction. Uniqueness of
/// `user_id`, `email`, `calendar_code` and `schedule_id` is enforced by the
/// database, so racing inserts resolve to one success and one
/// [`Error::Conflict`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap round trip used by health checks.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let (users, calendars, schedules): (i64, i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM calendars),
                    (SELECT COUNT(*) FROM schedules)",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(StoreStats {
            users,
            calendars,
            schedules,
        })
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        insert_user(&mut tx, &user).await?;
        let created = fetch_user(&mut tx, &user.user_id)
            .await?
            .ok_or(Error::NotFound(Entity::User))?;
        tx.commit().await?;
        debug!(user_id = %created.user_id, "user created");
        Ok(created)
    }

    /// Create a user and its first calendar as one unit. If the calendar
    /// cannot be created the user is rolled back too.
    pub async fn create_user_with_calendar(
        &self,
        user: NewUser,
        calendar: NewCalendar,
    ) -> Result<(User, Calendar)> {
        let mut tx = self.pool.begin().await?;
        insert_user(&mut tx, &user).await?;
        insert_calendar(&mut tx, &user.user_id, &calendar).await?;
        let created_user = fetch_user(&mut tx, &user.user_id)
            .await?
            .ok_or(Error::NotFound(Entity::User))?;
        let created_calendar = fetch_calendar(&mut tx, &calendar.code)
            .await?
            .ok_or(Error::NotFound(Entity::Calendar))?;
        tx.commit().await?;
        debug!(
            user_id = %created_user.user_id,
            calendar = %created_calendar.code,
            "user created with calendar"
        );
        Ok((created_user, created_calendar))
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        fetch_user(&mut conn, user_id).await
    }

    /// Delete a user, cascading to its calendars and their schedules.
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(Entity::User));
        }
        debug!(user_id, "user deleted");
        Ok(())
    }

    // ── Calendars ────────────────────────────────────────────────────────

    /// Create a calendar owned by `owner_user_id`.
    pub async fn create_calendar(
        &self,
        owner_user_id: &str,
        calendar: NewCalendar,
    ) -> Result<Calendar> {
        let mut tx = self.pool.begin().await?;
        insert_calendar(&mut tx, owner_user_id, &calendar).await?;
        let created = fetch_calendar(&mut tx, &calendar.code)
            .await?
            .ok_or(Error::NotFound(Entity::Calendar))?;
        tx.commit().await?;
        debug!(calendar = %created.code, owner = owner_user_id, "calendar created");
        Ok(created)
    }

    pub async fn calendar(&self, code: &str) -> Result<Option<Calendar>> {
        let mut conn = self.pool.acquire().await?;
        fetch_calendar(&mut conn, code).await
    }

    pub async fn calendars_owned_by(&self, user_id: &str) -> Result<Vec<Calendar>> {
        let rows = sqlx::query_as::<_, CalendarRow>(&format!(
            "{SELECT_CALENDAR} WHERE u.user_id = ? ORDER BY c.id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Delete a calendar, cascading to its schedules.
    pub async fn delete_calendar(&self, code: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM calendars WHERE calendar_code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(Entity::Calendar));
        }
        debug!(calendar = code, "calendar deleted");
        Ok(())
    }

    // ── Schedules ────────────────────────────────────────────────────────

    /// Create a schedule under the calendar identified by `calendar_code`.
    pub async fn create_schedule(
        &self,
        calendar_code: &str,
        schedule: NewSchedule,
    ) -> Result<Schedule> {
        // Compared as stored so the check agrees with the table constraint.
        let start = schedule.start.format(TIME_FORMAT).to_string();
        let end = schedule.end.format(TIME_FORMAT).to_string();
        if start >= end {
            return Err(Error::InvalidTimeRange);
        }

        let location = schedule
            .location
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let participants = serde_json::to_string(&schedule.participants)?;
        let tags = serde_json::to_string(&schedule.tags)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "INSERT INTO schedules (schedule_id, date, start_time, end_time, title, description,
                 location, participants, estimated_cost, tags, importance, notes, calendar_id)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, id
             FROM calendars WHERE calendar_code = ?",
        )
        .bind(&schedule.schedule_id)
        .bind(schedule.date.format(DATE_FORMAT).to_string())
        .bind(start)
        .bind(end)
        .bind(&schedule.title)
        .bind(&schedule.description)
        .bind(location)
        .bind(participants)
        .bind(schedule.estimated_cost)
        .bind(tags)
        .bind(i64::from(schedule.importance))
        .bind(&schedule.notes)
        .bind(calendar_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::from_write(e, Entity::Calendar))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(Entity::Calendar));
        }

        let created = fetch_schedule(&mut tx, &schedule.schedule_id)
            .await?
            .ok_or(Error::NotFound(Entity::Schedule))?;
        tx.commit().await?;
        debug!(schedule = %created.schedule_id, calendar = calendar_code, "schedule created");
        Ok(created)
    }

    pub async fn schedule(&self, schedule_id: &str) -> Result<Option<Schedule>> {
        let mut conn = self.pool.acquire().await?;
        fetch_schedule(&mut conn, schedule_id).await
    }

    pub async fn schedules_in_calendar(&self, code: &str) -> Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
            "{SELECT_SCHEDULE} WHERE c.calendar_code = ? {SCHEDULE_ORDER}"
        ))
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Schedules in the calendars owned by `user_id`.
    pub async fn schedules_owned_by(&self, user_id: &str) -> Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
            "{SELECT_SCHEDULE} WHERE u.user_id = ? {SCHEDULE_ORDER}"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Every schedule in every calendar, regardless of owner.
    pub async fn all_schedules(&self) -> Result<Vec<Schedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!("{SELECT_SCHEDULE} {SCHEDULE_ORDER}"))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn delete_schedule(&self, schedule_id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM schedules WHERE schedule_id = ?")
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(Entity::Schedule));
        }
        debug!(schedule = schedule_id, "schedule deleted");
        Ok(())
    }
}

// ── Statement helpers ───────────────────────────────────────────────────────

/// Insert a user row. A taken `user_id` is always reported as such, even when
/// the email collides too and SQLite names that index first.
async fn insert_user(conn: &mut SqliteConnection, user: &NewUser) -> Result<()> {
    let inserted = sqlx::query(
        "INSERT INTO users (user_id, name, email, password_hash, user_type, phone, profile)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&user.user_id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role.as_str())
    .bind(&user.phone)
    .bind(&user.profile)
    .execute(&mut *conn)
    .await;

    match inserted.map_err(|e| Error::from_write(e, Entity::User)) {
        Ok(_) => Ok(()),
        Err(Error::Conflict { field }) if field != "user_id" => {
            let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE user_id = ?")
                .bind(&user.user_id)
                .fetch_optional(&mut *conn)
                .await?;
            Err(Error::conflict(if taken.is_some() { "user_id".to_string() } else { field }))
        },
        Err(e) => Err(e),
    }
}

async fn insert_calendar(
    conn: &mut SqliteConnection,
    owner_user_id: &str,
    calendar: &NewCalendar,
) -> Result<()> {
    let result = sqlx::query(
        "INSERT INTO calendars (calendar_code, name, description, owner_id)
         SELECT ?, ?, ?, id FROM users WHERE user_id = ?",
    )
    .bind(&calendar.code)
    .bind(&calendar.name)
    .bind(&calendar.description)
    .bind(owner_user_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| Error::from_write(e, Entity::User))?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(Entity::User));
    }
    Ok(())
}

async fn fetch_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE user_id = ?"))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(TryInto::try_into)
        .transpose()
}

async fn fetch_calendar(conn: &mut SqliteConnection, code: &str) -> Result<Option<Calendar>> {
    let row = sqlx::query_as::<_, CalendarRow>(&format!(
        "{SELECT_CALENDAR} WHERE c.calendar_code = ?"
    ))
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(Into::into))
}

async fn fetch_schedule(conn: &mut SqliteConnection, schedule_id: &str) -> Result<Option<Schedule>> {
    sqlx::query_as::<_, ScheduleRow>(&format!("{SELECT_SCHEDULE} WHERE s.schedule_id = ?"))
        .bind(schedule_id)
        .fetch_optional(&mut *conn)
        .await?
        .map(TryInto::try_into)
        .transpose()
}

// ── Row types ───────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: String,
    name: String,
    email: String,
    password_hash: String,
    user_type: String,
    phone: Option<String>,
    profile: Option<String>,
    created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(r: UserRow) -> Result<Self> {
        Ok(Self {
            role: r.user_type.parse().context("invalid user_type")?,
            user_id: r.user_id,
            name: r.name,
            email: r.email,
            password_hash: r.password_hash,
            phone: r.phone,
            profile: r.profile,
            created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CalendarRow {
    calendar_code: String,
    name: String,
    description: Option<String>,
    created_at: String,
    owner_id: String,
    owner_name: String,
}

impl From<CalendarRow> for Calendar {
    fn from(r: CalendarRow) -> Self {
        Self {
            code: r.calendar_code,
            name: r.name,
            description: r.description,
            created_at: r.created_at,
            owner: Owner {
                user_id: r.owner_id,
                name: r.owner_name,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    schedule_id: String,
    date: String,
    start_time: String,
    end_time: String,
    title: String,
    description: Option<String>,
    location: Option<String>,
    participants: String,
    estimated_cost: Option<i64>,
    tags: String,
    importance: i64,
    notes: Option<String>,
    created_at: String,
    calendar_code: String,
    calendar_name: String,
    owner_id: String,
    owner_name: String,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = Error;

    fn try_from(r: ScheduleRow) -> Result<Self> {
        Ok(Self {
            date: NaiveDate::parse_from_str(&r.date, DATE_FORMAT).context("invalid schedule date")?,
            start: NaiveTime::parse_from_str(&r.start_time, TIME_FORMAT)
                .context("invalid schedule start_time")?,
            end: NaiveTime::parse_from_str(&r.end_time, TIME_FORMAT)
                .context("invalid schedule end_time")?,
            location: r.location.as_deref().map(serde_json::from_str).transpose()?,
            participants: serde_json::from_str(&r.participants)?,
            tags: serde_json::from_str(&r.tags)?,
            importance: u8::try_from(r.importance).context("invalid schedule importance")?,
            schedule_id: r.schedule_id,
            title: r.title,
            description: r.description,
            estimated_cost: r.estimated_cost,
            notes: r.notes,
            created_at: r.created_at,
            calendar_code: r.calendar_code,
            calendar_name: r.calendar_name,
            owner: Owner {
                user_id: r.owner_id,
                name: r.owner_name,
            },
        })
    }
}
