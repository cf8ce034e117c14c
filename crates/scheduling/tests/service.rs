#![allow(clippy::unwrap_used, clippy::expect_used)]

use {
    agenda_common::Entity,
    agenda_config::AuthConfig,
    agenda_scheduling::{
        CalendarRequest, Error, Identity, LoginRequest, ScheduleRequest, SchedulingService,
        SignupRequest,
    },
    agenda_store::SqliteStore,
    secrecy::Secret,
};

async fn service_at(url: &str, max_connections: u32) -> SchedulingService {
    let pool = agenda_store::connect(url, max_connections).await.unwrap();
    agenda_store::run_migrations(&pool).await.unwrap();
    SchedulingService::new(SqliteStore::new(pool), AuthConfig::default())
}

async fn service() -> SchedulingService {
    service_at("sqlite::memory:", 1).await
}

fn signup_request(user_id: &str, password: &str) -> SignupRequest {
    SignupRequest {
        user_id: Some(user_id.into()),
        name: Some(format!("Name of {user_id}")),
        email: Some(format!("{user_id}@example.com")),
        password: Some(Secret::new(password.into())),
        ..SignupRequest::default()
    }
}

fn login_request(user_id: &str, password: &str) -> LoginRequest {
    LoginRequest {
        user_id: Some(user_id.into()),
        password: Some(Secret::new(password.into())),
    }
}

fn standup() -> ScheduleRequest {
    ScheduleRequest {
        title: Some("Standup".into()),
        start_time: Some("2025-01-01T09:00:00Z".into()),
        end_time: Some("2025-01-01T09:15:00Z".into()),
        ..ScheduleRequest::default()
    }
}

/// Sign up, log in, and resolve the returned token.
async fn user(svc: &SchedulingService, user_id: &str) -> (String, Identity) {
    svc.signup(signup_request(user_id, "pw")).await.unwrap();
    let token = svc.login(login_request(user_id, "pw")).await.unwrap().token;
    let identity = svc.resolve_identity(&token).await.unwrap();
    (token, identity)
}

#[tokio::test]
async fn standup_scenario() {
    let svc = service().await;
    svc.signup(signup_request("u1", "p1")).await.unwrap();
    let login = svc.login(login_request("u1", "p1")).await.unwrap();
    let t = svc.resolve_identity(&login.token).await.unwrap();

    let work = svc
        .create_calendar(Some(&t), CalendarRequest {
            name: Some("Work".into()),
            description: None,
        })
        .await
        .unwrap();
    let schedule = svc
        .create_schedule(Some(&t), &work.calendar_code, standup())
        .await
        .unwrap();
    assert!(schedule.is_my_schedule);
    assert_eq!(schedule.color, "#667eea");
    assert_eq!(schedule.owner_id, "u1");

    let (_, u2) = user(&svc, "u2").await;
    let err = svc
        .delete_schedule(Some(&u2), &schedule.schedule_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    svc.delete_schedule(Some(&t), &schedule.schedule_id)
        .await
        .unwrap();
    let err = svc
        .get_schedule(Some(&t), &schedule.schedule_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(Entity::Schedule)));
}

#[tokio::test]
async fn signup_creates_exactly_one_default_calendar() {
    let svc = service().await;
    let outcome = svc.signup(signup_request("sch_001", "pw")).await.unwrap();
    assert_eq!(outcome.default_calendar.calendar_code, "sch_001_default");
    assert_eq!(outcome.default_calendar.name, "My Calendar");
    assert_eq!(outcome.default_calendar.owner_id, "sch_001");

    let token = svc
        .login(login_request("sch_001", "pw"))
        .await
        .unwrap()
        .token;
    let identity = svc.resolve_identity(&token).await.unwrap();
    let calendars = svc.list_calendars(Some(&identity)).await.unwrap();
    assert_eq!(calendars.len(), 1);
    assert_eq!(calendars[0].calendar_code, "sch_001_default");

    let existence = svc.calendar_exists("sch_001_default").await.unwrap();
    assert!(existence.exists);
    assert_eq!(existence.owner_id.as_deref(), Some("sch_001"));
}

#[tokio::test]
async fn signup_validates_and_rejects_duplicates() {
    let svc = service().await;

    let mut missing = signup_request("u1", "pw");
    missing.email = Some("  ".into());
    assert!(matches!(
        svc.signup(missing).await.unwrap_err(),
        Error::Validation { ref field, .. } if field == "email"
    ));

    let mut bad_role = signup_request("u1", "pw");
    bad_role.user_type = Some("root".into());
    assert!(matches!(
        svc.signup(bad_role).await.unwrap_err(),
        Error::Validation { ref field, .. } if field == "user_type"
    ));

    let mut empty_password = signup_request("u1", "");
    empty_password.password = Some(Secret::new(String::new()));
    assert!(matches!(
        svc.signup(empty_password).await.unwrap_err(),
        Error::Validation { ref field, .. } if field == "password"
    ));

    svc.signup(signup_request("u1", "pw")).await.unwrap();
    assert!(matches!(
        svc.signup(signup_request("u1", "pw")).await.unwrap_err(),
        Error::Conflict { ref field } if field == "user_id"
    ));
    let mut same_id = signup_request("u1", "pw");
    same_id.email = Some("someone.else@example.com".into());
    assert!(matches!(
        svc.signup(same_id).await.unwrap_err(),
        Error::Conflict { ref field } if field == "user_id"
    ));

    let mut same_email = signup_request("u2", "pw");
    same_email.email = Some("u1@example.com".into());
    assert!(matches!(
        svc.signup(same_email).await.unwrap_err(),
        Error::Conflict { ref field } if field == "email"
    ));
    assert_eq!(svc.summary().await.unwrap().users, 1);
}

#[tokio::test]
async fn concurrent_signups_with_same_id_have_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("agenda.db").display());
    let svc = service_at(&url, 4).await;

    let (a, b) = tokio::join!(
        svc.signup(signup_request("racer", "pw")),
        svc.signup(signup_request("racer", "pw")),
    );
    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict { .. })))
        .count();
    assert_eq!((wins, conflicts), (1, 1));

    let stats = svc.summary().await.unwrap();
    assert_eq!((stats.users, stats.calendars), (1, 1));
}

#[tokio::test]
async fn login_does_not_reveal_which_part_was_wrong() {
    let svc = service().await;
    svc.signup(signup_request("u1", "right")).await.unwrap();

    let wrong_password = svc.login(login_request("u1", "wrong")).await.unwrap_err();
    let no_user = svc.login(login_request("ghost", "right")).await.unwrap_err();
    assert!(matches!(wrong_password, Error::Unauthorized));
    assert!(matches!(no_user, Error::Unauthorized));
    assert_eq!(wrong_password.to_string(), no_user.to_string());
}

#[tokio::test]
async fn tokens_for_ids_containing_the_delimiter_resolve() {
    let svc = service().await;
    let (token, identity) = user(&svc, "team_lead_01").await;
    assert!(token.starts_with("token_team_lead_01_"));
    assert_eq!(identity.user_id, "team_lead_01");

    assert!(matches!(
        svc.resolve_identity("token_ghost_1.0").await.unwrap_err(),
        Error::Unauthorized
    ));
    assert!(matches!(
        svc.resolve_identity("garbage").await.unwrap_err(),
        Error::Unauthorized
    ));
    assert!(svc.identify(Some("garbage")).await.unwrap().is_none());
    assert!(svc.identify(None).await.unwrap().is_none());
}

#[tokio::test]
async fn reads_are_global_and_writes_owner_only() {
    let svc = service().await;
    let (_, u1) = user(&svc, "u1").await;
    let (_, u2) = user(&svc, "u2").await;

    let created = svc
        .create_schedule(Some(&u1), "u1_default", standup())
        .await
        .unwrap();

    let err = svc
        .create_schedule(Some(&u2), "u1_default", standup())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden { .. }));

    let seen_by_u2 = svc
        .list_schedules_for_calendar(Some(&u2), "u1_default")
        .await
        .unwrap();
    assert_eq!(seen_by_u2.len(), 1);
    assert!(!seen_by_u2[0].is_my_schedule);
    assert_eq!(seen_by_u2[0].owner_name, "Name of u1");
    assert_eq!(seen_by_u2[0].color, "#10b981");

    let anonymous = svc.get_schedule(None, &created.schedule_id).await.unwrap();
    assert!(!anonymous.is_my_schedule);

    assert!(matches!(
        svc.list_schedules_for_calendar(None, "u1_default")
            .await
            .unwrap_err(),
        Error::Unauthorized
    ));
    assert!(matches!(
        svc.list_schedules_for_calendar(Some(&u2), "nope")
            .await
            .unwrap_err(),
        Error::NotFound(Entity::Calendar)
    ));
    assert!(matches!(
        svc.create_schedule(Some(&u1), "nope", standup())
            .await
            .unwrap_err(),
        Error::NotFound(Entity::Calendar)
    ));
    assert!(matches!(
        svc.create_schedule(None, "u1_default", standup())
            .await
            .unwrap_err(),
        Error::Unauthorized
    ));
}

#[tokio::test]
async fn user_feed_is_global_and_flagged_for_that_user() {
    let svc = service().await;
    let (_, u1) = user(&svc, "u1").await;
    let (_, u2) = user(&svc, "u2").await;
    svc.create_schedule(Some(&u1), "u1_default", standup())
        .await
        .unwrap();
    svc.create_schedule(Some(&u2), "u2_default", standup())
        .await
        .unwrap();

    let feed = svc.list_schedules_for_user(Some(&u2), "u1").await.unwrap();
    assert_eq!(feed.len(), 2);
    for item in &feed {
        assert_eq!(item.is_my_schedule, item.owner_id == "u1");
    }

    assert!(matches!(
        svc.list_schedules_for_user(Some(&u1), "ghost")
            .await
            .unwrap_err(),
        Error::NotFound(Entity::User)
    ));
}

#[tokio::test]
async fn export_holds_only_that_users_data() {
    let svc = service().await;
    let (_, u1) = user(&svc, "u1").await;
    let (_, u2) = user(&svc, "u2").await;
    svc.create_calendar(Some(&u1), CalendarRequest {
        name: Some("Side".into()),
        description: None,
    })
    .await
    .unwrap();
    let mine = svc
        .create_schedule(Some(&u1), "u1_default", standup())
        .await
        .unwrap();
    svc.create_schedule(Some(&u2), "u2_default", standup())
        .await
        .unwrap();

    let export = svc.export_user(Some(&u2), "u1").await.unwrap();
    assert_eq!(export.user_info.user_id, "u1");
    assert_eq!(export.statistics.calendars_count, 2);
    assert_eq!(export.statistics.schedules_count, 1);
    assert_eq!(export.calendars.len(), 2);
    assert_eq!(export.schedules.len(), 1);
    assert_eq!(export.schedules[0].schedule_id, mine.schedule_id);
    assert!(!export.schedules[0].is_my_schedule);

    let feed = svc.list_schedules_for_user(Some(&u2), "u1").await.unwrap();
    assert_eq!(feed.len(), 2);

    assert!(matches!(
        svc.export_user(None, "u1").await.unwrap_err(),
        Error::Unauthorized
    ));
    assert!(matches!(
        svc.export_user(Some(&u1), "ghost").await.unwrap_err(),
        Error::NotFound(Entity::User)
    ));
}

#[tokio::test]
async fn deleting_calendar_and_user_cascade() {
    let svc = service().await;
    let (_, u1) = user(&svc, "u1").await;
    let (_, u2) = user(&svc, "u2").await;
    let extra = svc
        .create_calendar(Some(&u1), CalendarRequest {
            name: Some("Side".into()),
            description: Some("side projects".into()),
        })
        .await
        .unwrap();
    assert!(extra.calendar_code.starts_with("u1_"));
    let in_extra = svc
        .create_schedule(Some(&u1), &extra.calendar_code, standup())
        .await
        .unwrap();
    let in_default = svc
        .create_schedule(Some(&u1), "u1_default", standup())
        .await
        .unwrap();

    assert!(matches!(
        svc.delete_calendar(Some(&u2), &extra.calendar_code)
            .await
            .unwrap_err(),
        Error::Forbidden { .. }
    ));
    svc.delete_calendar(Some(&u1), &extra.calendar_code)
        .await
        .unwrap();
    assert!(matches!(
        svc.get_schedule(None, &in_extra.schedule_id).await.unwrap_err(),
        Error::NotFound(Entity::Schedule)
    ));

    assert!(matches!(
        svc.delete_user(Some(&u2), "u1").await.unwrap_err(),
        Error::Forbidden { .. }
    ));
    svc.delete_user(Some(&u1), "u1").await.unwrap();
    assert!(!svc.user_exists("u1").await.unwrap().exists);
    assert!(!svc.calendar_exists("u1_default").await.unwrap().exists);
    assert!(svc.get_schedule(None, &in_default.schedule_id).await.is_err());

    let stats = svc.summary().await.unwrap();
    assert_eq!((stats.users, stats.calendars, stats.schedules), (1, 1, 0));
}

#[tokio::test]
async fn schedule_validation_surfaces_field_names() {
    let svc = service().await;
    let (_, u1) = user(&svc, "u1").await;

    let mut backwards = standup();
    backwards.end_time = Some("2025-01-01T08:00:00Z".into());
    assert!(matches!(
        svc.create_schedule(Some(&u1), "u1_default", backwards)
            .await
            .unwrap_err(),
        Error::Validation { ref field, .. } if field == "endTime"
    ));

    let mut untitled = standup();
    untitled.title = None;
    assert!(matches!(
        svc.create_schedule(Some(&u1), "u1_default", untitled)
            .await
            .unwrap_err(),
        Error::Validation { ref field, .. } if field == "title"
    ));
    assert_eq!(svc.summary().await.unwrap().schedules, 0);
}
