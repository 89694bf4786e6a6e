//! Directory scenarios against the SQLite store on disk.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use checkin_core::scheduler::{FixedClock, SeededJitter};
use checkin_core::{
    CheckInFrequency, CreateRequest, GetRequest, Patch, Relationship, UpdateRequest,
};
use chrono::{NaiveDate, TimeZone, Utc};
use connectify::{Directory, ErrorKind, SqliteStore};

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("date")
}

fn open(tmp: &tempfile::TempDir, seed: u64) -> Directory {
    let store = SqliteStore::open(&tmp.path().join("local").join("Connections.db"))
        .expect("open store");
    let clock = FixedClock(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("instant"),
    );
    Directory::new(Arc::new(store))
        .with_clock(Arc::new(clock))
        .with_jitter(Arc::new(SeededJitter::new(seed)))
}

fn create(user: &str, contact: &str, frequency: &str) -> CreateRequest {
    CreateRequest {
        user_id: user.into(),
        contact_id: contact.into(),
        name: "Alice".into(),
        birthday: None,
        check_in_frequency: frequency.into(),
    }
}

fn key(user: &str, contact: &str) -> GetRequest {
    GetRequest {
        user_id: user.into(),
        contact_id: contact.into(),
    }
}

async fn fetch(dir: &Directory, user: &str, contact: &str) -> Relationship {
    dir.get(&key(user, contact)).await.expect("get")
}

#[tokio::test]
async fn monthly_create_on_new_year_lands_in_window() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 1);

    for contact in 0..20 {
        let contact = format!("c{contact}");
        let created = dir
            .create(&create("u1", &contact, "Monthly"))
            .await
            .expect("create");
        assert!(
            (ymd(2024, 1, 16)..=ymd(2024, 2, 15)).contains(&created.check_in_date),
            "{} outside window",
            created.check_in_date
        );
    }
}

#[tokio::test]
async fn name_only_update_leaves_other_fields() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 2);
    let mut req = create("u1", "c1", "Twice a Month");
    req.birthday = Some("1985-12-24".into());
    let before = dir.create(&req).await.expect("create");

    let update = UpdateRequest {
        user_id: "u1".into(),
        contact_id: "c1".into(),
        name: Patch::Value("X".into()),
        ..Default::default()
    };
    let summary = dir.update(&update).await.expect("update");
    assert_eq!(summary.fields_touched, 1);
    assert_eq!(
        summary
            .updated_attributes
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>(),
        vec!["Name"]
    );

    let after = fetch(&dir, "u1", "c1").await;
    assert_eq!(after.name, "X");
    assert_eq!(after.birthday, before.birthday);
    assert_eq!(after.check_in_frequency, before.check_in_frequency);
    assert_eq!(after.check_in_date, before.check_in_date);
}

#[tokio::test]
async fn frequency_update_always_moves_date_with_it() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 3);
    dir.create(&create("u1", "c1", "Semiannually"))
        .await
        .expect("create");

    let update = UpdateRequest {
        user_id: "u1".into(),
        contact_id: "c1".into(),
        check_in_frequency: Patch::Value("Monthly".into()),
        ..Default::default()
    };
    let summary = dir.update(&update).await.expect("update");
    assert!(summary.updated_attributes.contains_key("CheckInFrequency"));
    assert!(summary.updated_attributes.contains_key("CheckInDate"));

    let after = fetch(&dir, "u1", "c1").await;
    assert_eq!(after.check_in_frequency, CheckInFrequency::Monthly);
    assert!((ymd(2024, 1, 16)..=ymd(2024, 2, 15)).contains(&after.check_in_date));
}

#[tokio::test]
async fn invalid_frequency_update_leaves_item_untouched() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 4);
    let before = dir
        .create(&create("u1", "c1", "Quarterly"))
        .await
        .expect("create");

    let update = UpdateRequest {
        user_id: "u1".into(),
        contact_id: "c1".into(),
        name: Patch::Value("Renamed".into()),
        check_in_frequency: Patch::Value("Fortnightly".into()),
        ..Default::default()
    };
    let err = dir.update(&update).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFrequency);
    assert_eq!(fetch(&dir, "u1", "c1").await, before);
}

#[tokio::test]
async fn items_survive_reopen() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let created = {
        let dir = open(&tmp, 5);
        dir.create(&create("u1", "c1", "Twice a Year"))
            .await
            .expect("create")
    };
    let dir = open(&tmp, 6);
    assert_eq!(fetch(&dir, "u1", "c1").await, created);
}

#[tokio::test]
async fn keys_are_scoped_per_user() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 7);
    dir.create(&create("u1", "c1", "Monthly"))
        .await
        .expect("create");

    let err = dir.get(&key("u2", "c1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    dir.delete(&key("u2", "c1")).await.expect("delete other user");
    assert!(dir.get(&key("u1", "c1")).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_updates_to_disjoint_fields_both_apply() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = open(&tmp, 8);
    dir.create(&create("u1", "c1", "Monthly"))
        .await
        .expect("create");

    let rename = {
        let dir = dir.clone();
        tokio::spawn(async move {
            let req = UpdateRequest {
                user_id: "u1".into(),
                contact_id: "c1".into(),
                name: Patch::Value("Alicia".into()),
                ..Default::default()
            };
            dir.update(&req).await
        })
    };
    let birthday = {
        let dir = dir.clone();
        tokio::spawn(async move {
            let req = UpdateRequest {
                user_id: "u1".into(),
                contact_id: "c1".into(),
                birthday: Patch::Value("1990-05-01".into()),
                ..Default::default()
            };
            dir.update(&req).await
        })
    };
    rename.await.expect("join").expect("rename");
    birthday.await.expect("join").expect("birthday");

    let after = fetch(&dir, "u1", "c1").await;
    assert_eq!(after.name, "Alicia");
    assert_eq!(after.birthday, Some(ymd(1990, 5, 1)));
}
