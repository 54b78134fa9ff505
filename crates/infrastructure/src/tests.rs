use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use dashsync_application::{
    DashboardRepository, DashboardService, SaveDashboardInput, SocialConnector,
    SocialConnectorRegistry,
};
use dashsync_core::{OrgId, OrgRole, SignedInUser};
use dashsync_domain::Dashboard;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::social::test_server::serve;
use crate::{
    InMemoryDashboardAlertStore, InMemoryDashboardRepository, OAuthClientConfig,
    OAuthProviderSettings, OrgRoleDashboardGuardian, RepoMapping, SocialBase, SocialGitlab,
};

type Commits = Arc<Mutex<Vec<Value>>>;

async fn record_commit(State(commits): State<Commits>, Json(body): Json<Value>) -> Json<Value> {
    commits.lock().await.push(body);
    Json(json!({ "id": "c0ffee" }))
}

struct Stack {
    service: DashboardService,
    repository: Arc<InMemoryDashboardRepository>,
    alerts: Arc<InMemoryDashboardAlertStore>,
    commits: Commits,
}

async fn stack() -> Stack {
    let commits = Commits::default();
    let captured = commits.clone();
    let base_url = serve(move |_| {
        Router::new()
            .route("/api/v4/projects/{project}/repository/commits", post(record_commit))
            .with_state(captured)
    })
    .await;

    let settings = OAuthProviderSettings {
        enabled: true,
        auth_url: format!("{base_url}/oauth/authorize"),
        api_url: format!("{base_url}/api/v4"),
        repos: vec![RepoMapping {
            org_id: OrgId::new(1),
            repo_id: 12,
            branch: "main".to_owned(),
            url: base_url.clone(),
            dashboards_path: "dashboards".to_owned(),
        }],
        ..OAuthProviderSettings::default()
    };
    let base = SocialBase::new(
        "gitlab",
        OAuthClientConfig::from_settings(&settings, "http://localhost:3000/login/gitlab"),
        reqwest::Client::new(),
    )
    .unwrap_or_else(|_| unreachable!());
    let gitlab: Arc<dyn SocialConnector> = Arc::new(SocialGitlab::new(base, &settings));

    let repository = Arc::new(InMemoryDashboardRepository::new());
    let alerts = Arc::new(InMemoryDashboardAlertStore::new());
    let service = DashboardService::new(
        repository.clone(),
        alerts.clone(),
        alerts.clone(),
        Arc::new(OrgRoleDashboardGuardian::new()),
        Arc::new(SocialConnectorRegistry::new([("gitlab".to_owned(), gitlab)])),
    );

    Stack {
        service,
        repository,
        alerts,
        commits,
    }
}

fn gitlab_editor() -> SignedInUser {
    SignedInUser::new(4, OrgId::new(1), OrgRole::Editor, "jdoe")
        .with_external_identity("gitlab", "gl-token")
}

#[tokio::test]
async fn saving_and_moving_a_dashboard_mirrors_every_step() {
    let stack = stack().await;
    let org_id = OrgId::new(1);
    let local_editor = SignedInUser::new(2, org_id, OrgRole::Editor, "local");

    let folder = stack
        .service
        .save_dashboard(SaveDashboardInput::new(
            org_id,
            local_editor,
            Dashboard::from_json(org_id, json!({ "title": "Ops" })).as_folder(),
        ))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(stack.commits.lock().await.is_empty());

    let created = stack
        .service
        .save_dashboard(SaveDashboardInput::new(
            org_id,
            gitlab_editor(),
            Dashboard::from_json(
                org_id,
                json!({
                    "title": "Latency",
                    "panels": [{ "id": 1, "alert": { "name": "Slow", "conditions": [{}] } }]
                }),
            ),
        ))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(stack.alerts.rules_for_dashboard(org_id, created.id()).await.len(), 1);

    let moved = Dashboard::from_json(org_id, created.data().clone()).with_folder_id(folder.id());
    let result = stack
        .service
        .save_dashboard(SaveDashboardInput::new(org_id, gitlab_editor(), moved).with_message("move"))
        .await;
    assert!(result.is_ok_and(|dashboard| dashboard.version() == 2 && dashboard.folder_id() == folder.id()));

    let commits = stack.commits.lock().await;
    let actions: Vec<(Value, Value)> = commits
        .iter()
        .map(|commit| {
            (
                commit["actions"][0]["action"].clone(),
                commit["actions"][0]["file_path"].clone(),
            )
        })
        .collect();
    assert_eq!(
        actions,
        vec![
            (json!("create"), json!("dashboards/General/latency.json")),
            (json!("delete"), json!("dashboards/General/latency.json")),
            (json!("create"), json!("dashboards/Ops/latency.json")),
        ]
    );
}

#[tokio::test]
async fn viewer_save_is_denied_before_anything_is_mirrored() {
    let stack = stack().await;
    let org_id = OrgId::new(1);
    let viewer = SignedInUser::new(5, org_id, OrgRole::Viewer, "viewer")
        .with_external_identity("gitlab", "gl-token");

    let result = stack
        .service
        .save_dashboard(SaveDashboardInput::new(
            org_id,
            viewer,
            Dashboard::from_json(org_id, json!({ "title": "Nope" })),
        ))
        .await;

    assert!(matches!(result, Err(dashsync_core::AppError::Forbidden(_))));
    assert!(stack.commits.lock().await.is_empty());
    let stored = stack.repository.find_dashboard_by_id(1).await;
    assert!(stored.is_ok_and(|dashboard| dashboard.is_none()));
}
