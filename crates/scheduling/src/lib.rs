//! Calendars and schedules shared between users.
//!
//! Reads are global: any caller may list any calendar's schedules, and each
//! item is flagged with whether the viewer owns it. Writes are owner-only,
//! decided by the table in [`policy`].

pub mod error;
pub mod policy;
pub mod service;
pub mod types;

pub use {
    error::{Error, ErrorKind, Result},
    policy::{Access, Decision, Denial, Identity, Operation, authorize},
    service::SchedulingService,
    types::{
        CalendarExistence, CalendarRequest, CalendarView, ExportStatistics, LocationInput,
        LoginOutcome, LoginRequest, ScheduleRequest, ScheduleView, SignupOutcome,
        SignupRequest, UserExistence, UserExport, UserView,
    },
};
