//! Access policy for calendars and schedules.
//!
//! Reading is global and writing is owner-only. Every rule lives in
//! [`Operation::access`] so the whole policy can be read and tested in one
//! place.

use crate::error::{Error, Result};

/// A caller whose bearer token resolved to an existing user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
}

/// Everything a caller can ask the service to do to an owned entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateCalendar,
    ListCalendars,
    DeleteCalendar,
    CreateSchedule,
    DeleteSchedule,
    ListCalendarSchedules,
    ListUserSchedules,
    ExportUser,
    ReadSchedule,
    DeleteUser,
}

/// Who an operation is open to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No credential needed.
    Anyone,
    /// Any resolved identity.
    Authenticated,
    /// Only the user at the root of the target's ownership chain.
    Owner,
}

impl Operation {
    pub const ALL: [Self; 10] = [
        Self::CreateCalendar,
        Self::ListCalendars,
        Self::DeleteCalendar,
        Self::CreateSchedule,
        Self::DeleteSchedule,
        Self::ListCalendarSchedules,
        Self::ListUserSchedules,
        Self::ExportUser,
        Self::ReadSchedule,
        Self::DeleteUser,
    ];

    pub fn access(self) -> Access {
        match self {
            Self::ReadSchedule => Access::Anyone,
            Self::CreateCalendar
            | Self::ListCalendars
            | Self::ListCalendarSchedules
            | Self::ListUserSchedules
            | Self::ExportUser => Access::Authenticated,
            Self::DeleteCalendar
            | Self::CreateSchedule
            | Self::DeleteSchedule
            | Self::DeleteUser => Access::Owner,
        }
    }

    fn denial_reason(self) -> &'static str {
        match self {
            Self::DeleteCalendar => "only the owner can delete this calendar",
            Self::CreateSchedule => "only the calendar owner can add schedules",
            Self::DeleteSchedule => "only the calendar owner can delete this schedule",
            Self::DeleteUser => "users can only delete themselves",
            _ => "not permitted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

/// Decide whether `caller` may perform `operation` on a target owned by
/// `owner` (the `user_id` at the root of its ownership chain, if any).
pub fn authorize(caller: Option<&Identity>, operation: Operation, owner: Option<&str>) -> Decision {
    match (operation.access(), caller) {
        (Access::Anyone, _) => Decision::Allow,
        (_, None) => Decision::Deny(Denial::Unauthenticated),
        (Access::Authenticated, Some(_)) => Decision::Allow,
        (Access::Owner, Some(identity)) if owner == Some(identity.user_id.as_str()) => {
            Decision::Allow
        },
        (Access::Owner, Some(_)) => Decision::Deny(Denial::NotOwner),
    }
}

/// [`authorize`], turned into the error a caller should see.
pub(crate) fn enforce(
    caller: Option<&Identity>,
    operation: Operation,
    owner: Option<&str>,
) -> Result<()> {
    match authorize(caller, operation, owner) {
        Decision::Allow => Ok(()),
        Decision::Deny(Denial::Unauthenticated) => Err(Error::Unauthorized),
        Decision::Deny(Denial::NotOwner) => Err(Error::forbidden(operation.denial_reason())),
    }
}

/// Require a resolved identity before touching the target, so anonymous
/// callers cannot probe which ids exist.
pub(crate) fn authenticate(caller: Option<&Identity>) -> Result<&Identity> {
    caller.ok_or(Error::Unauthorized)
}
