use services::{AdminServiceError, AppServices};
use tracker_core::model::{TaskKey, UserId};
use tracker_core::time::fixed_clock;
use tracker_core::{ActivityLevel, CalendarDate};

async fn seeded(name: &str) -> (AppServices, UserId) {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let services = AppServices::new_sqlite(&url, fixed_clock())
        .await
        .expect("sqlite services");
    let profiles = services.profiles();
    let tracker = services.tracker();

    let admin = UserId::new("admin").unwrap();
    profiles.register(&admin, "root", "root@example.com").await.unwrap();
    profiles.grant_admin(&admin).await.unwrap();

    let task = TaskKey::new("walk").unwrap();
    for (id, days) in [("busy", 6), ("quiet", 1), ("idle", 0)] {
        let user = UserId::new(id).unwrap();
        profiles
            .register(&user, id, &format!("{id}@example.com"))
            .await
            .unwrap();
        for day in 1..=days {
            let date = CalendarDate::new(2023, 10, day).unwrap();
            tracker.set_task_status(&user, date, &task, true).await.unwrap();
        }
    }
    (services, admin)
}

#[tokio::test]
async fn admin_sees_rows_and_overview() {
    let (services, admin) = seeded("memdb_admin_overview").await;
    let admin_service = services.admin();

    let rows = admin_service.user_rows(&admin).await.unwrap();
    let ids: Vec<&str> = rows.iter().map(|row| row.user_id.as_str()).collect();
    assert_eq!(ids, vec!["busy", "quiet", "idle"]);
    assert_eq!(rows[0].activity_level, ActivityLevel::Good);
    assert_eq!(rows[1].activity_level, ActivityLevel::Fair);
    assert_eq!(rows[2].activity_level, ActivityLevel::Poor);

    let overview = admin_service.overview(&admin).await.unwrap();
    assert_eq!(overview.total_users, 3);
    assert_eq!(overview.active_users, 1);
    assert_eq!(overview.very_active_users, 0);
    assert_eq!(overview.new_users, 3);
    assert_eq!(overview.total_activities, 7);

    let busy = UserId::new("busy").unwrap();
    let calendar = admin_service.user_calendar(&admin, &busy).await.unwrap();
    assert_eq!(calendar.progress.completed_days, 6);
}

#[tokio::test]
async fn regular_users_are_denied_and_deleted_users_vanish() {
    let (services, admin) = seeded("memdb_admin_denied").await;
    let quiet = UserId::new("quiet").unwrap();
    assert!(matches!(
        services.admin().overview(&quiet).await,
        Err(AdminServiceError::AccessDenied(_))
    ));

    services.profiles().delete_account(&quiet).await.unwrap();
    let rows = services.admin().user_rows(&admin).await.unwrap();
    assert!(rows.iter().all(|row| row.user_id.as_str() != "quiet"));
}
