use dashsync_application::{DashboardRepository, SaveDashboardCommand};
use dashsync_core::{AppError, OrgId};
use dashsync_domain::{DashboardError, ProvisioningRecord, is_valid_short_uid};
use serde_json::{Value, json};

use super::InMemoryDashboardRepository;

fn command(data: Value) -> SaveDashboardCommand {
    SaveDashboardCommand {
        dashboard: data,
        message: String::new(),
        org_id: OrgId::new(1),
        overwrite: false,
        user_id: 1,
        folder_id: 0,
        is_folder: false,
        plugin_id: String::new(),
        updated_at: None,
    }
}

fn folder_command(title: &str) -> SaveDashboardCommand {
    SaveDashboardCommand {
        is_folder: true,
        ..command(json!({ "title": title }))
    }
}

#[tokio::test]
async fn save_assigns_id_version_and_uid() {
    let repository = InMemoryDashboardRepository::new();

    let saved = repository
        .save_dashboard(command(json!({ "title": "Memory" })))
        .await;
    assert!(saved.is_ok());

    let saved = saved.unwrap_or_else(|_| unreachable!());
    assert_eq!(saved.id(), 1);
    assert_eq!(saved.version(), 1);
    assert_eq!(saved.uid().len(), 9);
    assert!(is_valid_short_uid(saved.uid()));
    assert!(saved.updated().is_some());
    assert_eq!(saved.data()["version"], json!(1));
}

#[tokio::test]
async fn resave_bumps_version() {
    let repository = InMemoryDashboardRepository::new();
    let first = repository
        .save_dashboard(command(json!({ "title": "Memory" })))
        .await
        .unwrap_or_else(|_| unreachable!());

    let second = repository
        .save_dashboard(command(json!({ "id": first.id(), "title": "Memory", "version": 1 })))
        .await;

    assert!(second.is_ok_and(|dashboard| dashboard.version() == 2));
}

#[tokio::test]
async fn stale_version_is_rejected_without_overwrite() {
    let repository = InMemoryDashboardRepository::new();
    let saved = repository
        .save_dashboard(command(json!({ "title": "Memory" })))
        .await
        .unwrap_or_else(|_| unreachable!());
    let _ = repository
        .save_dashboard(command(json!({ "id": saved.id(), "title": "Memory", "version": 1 })))
        .await;

    let stale = command(json!({ "id": saved.id(), "title": "Memory", "version": 1 })).to_dashboard();
    let result = repository
        .validate_dashboard_before_save(OrgId::new(1), &stale, false)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(ref message))
        if message == &DashboardError::VersionMismatch.to_string()));

    let forced = repository
        .validate_dashboard_before_save(OrgId::new(1), &stale, true)
        .await;
    assert!(forced.is_ok());
}

#[tokio::test]
async fn reports_parent_folder_change() {
    let repository = InMemoryDashboardRepository::new();
    let folder = repository
        .save_dashboard(folder_command("Ops"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let saved = repository
        .save_dashboard(command(json!({ "title": "Moving" })))
        .await
        .unwrap_or_else(|_| unreachable!());

    let moved = command(json!({ "id": saved.id(), "title": "Moving", "version": 1 }))
        .to_dashboard()
        .with_folder_id(folder.id());
    let result = repository
        .validate_dashboard_before_save(OrgId::new(1), &moved, false)
        .await;

    assert!(result.is_ok_and(|result| result.is_parent_folder_changed));
}

#[tokio::test]
async fn same_title_in_folder_conflicts_unless_overwriting() {
    let repository = InMemoryDashboardRepository::new();
    let existing = repository
        .save_dashboard(command(json!({ "title": "Twin" })))
        .await
        .unwrap_or_else(|_| unreachable!());

    let twin = command(json!({ "title": "Twin" })).to_dashboard();
    let result = repository
        .validate_dashboard_before_save(OrgId::new(1), &twin, false)
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let overwritten = repository
        .save_dashboard(SaveDashboardCommand {
            overwrite: true,
            ..command(json!({ "title": "Twin", "panels": [] }))
        })
        .await;
    assert!(overwritten.is_ok_and(|dashboard| {
        dashboard.id() == existing.id() && dashboard.version() == 2
    }));
}

#[tokio::test]
async fn duplicate_uid_is_rejected() {
    let repository = InMemoryDashboardRepository::new();
    let _ = repository
        .save_dashboard(command(json!({ "title": "First", "uid": "shared" })))
        .await;

    let other = command(json!({ "title": "Second", "uid": "shared" })).to_dashboard();
    let result = repository
        .validate_dashboard_before_save(OrgId::new(1), &other, false)
        .await;

    assert!(matches!(result, Err(AppError::Conflict(ref message))
        if message == &DashboardError::WithSameUidExists.to_string()));
}

#[tokio::test]
async fn missing_folder_is_rejected() {
    let repository = InMemoryDashboardRepository::new();
    let orphan = command(json!({ "title": "Orphan" }))
        .to_dashboard()
        .with_folder_id(404);

    let result = repository
        .validate_dashboard_before_save(OrgId::new(1), &orphan, false)
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn provisioned_save_links_and_delete_unlinks() {
    let repository = InMemoryDashboardRepository::new();
    let saved = repository
        .save_provisioned_dashboard(
            command(json!({ "title": "Provisioned" })),
            ProvisioningRecord::new("default", "provisioned.json", "sum", 10),
        )
        .await
        .unwrap_or_else(|_| unreachable!());

    let record = repository
        .find_provisioned_dashboard_data_by_dashboard_id(saved.id())
        .await;
    assert!(record.is_ok_and(|record| {
        record.is_some_and(|record| record.dashboard_id == saved.id() && record.id == 1)
    }));

    let deleted = repository.delete_dashboard(OrgId::new(1), saved.id()).await;
    assert!(deleted.is_ok());

    let listed = repository.list_provisioned_dashboard_data("default").await;
    assert!(listed.is_ok_and(|records| records.is_empty()));
}

#[tokio::test]
async fn deleting_a_folder_removes_its_children() {
    let repository = InMemoryDashboardRepository::new();
    let folder = repository
        .save_dashboard(folder_command("Team"))
        .await
        .unwrap_or_else(|_| unreachable!());
    let child = repository
        .save_dashboard(SaveDashboardCommand {
            folder_id: folder.id(),
            ..command(json!({ "title": "Child" }))
        })
        .await
        .unwrap_or_else(|_| unreachable!());

    let deleted = repository.delete_dashboard(OrgId::new(1), folder.id()).await;
    assert!(deleted.is_ok());

    let found = repository.find_dashboard_by_id(child.id()).await;
    assert!(found.is_ok_and(|dashboard| dashboard.is_none()));
}

#[tokio::test]
async fn delete_in_other_org_is_not_found() {
    let repository = InMemoryDashboardRepository::new();
    let saved = repository
        .save_dashboard(command(json!({ "title": "Scoped" })))
        .await
        .unwrap_or_else(|_| unreachable!());

    let result = repository.delete_dashboard(OrgId::new(2), saved.id()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
