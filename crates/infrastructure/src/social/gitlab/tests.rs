use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, LINK};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use dashsync_application::{OAuthToken, SocialConnector};
use dashsync_core::{AppError, OrgId};
use dashsync_domain::{DashboardAction, DashboardError, UpdateDashboardOptions};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::{SocialGitlab, api_base_url};
use crate::social::base::{OAuthClientConfig, SocialBase};
use crate::social::settings::{OAuthProviderSettings, RepoMapping};
use crate::social::test_server::serve;

#[derive(Debug, Clone)]
struct GitlabState {
    base_url: String,
    user_state: &'static str,
    commits: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn user(State(state): State<GitlabState>) -> Json<Value> {
    Json(json!({
        "id": 17,
        "username": "jdoe",
        "name": "Jane Doe",
        "email": "jdoe@example.com",
        "state": state.user_state,
    }))
}

async fn groups(
    State(state): State<GitlabState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page = params
        .get("page")
        .and_then(|page| page.parse::<u32>().ok())
        .unwrap_or(1);
    let body = match page {
        1 => json!([{ "full_path": "ops" }, { "full_path": "ops/sre" }]),
        2 => json!([{ "full_path": "platform" }]),
        _ => json!([{ "full_path": "grafana-admins" }]),
    };

    let mut response = Json(body).into_response();
    if page < 3 {
        let link = format!(
            "<{base}/api/v4/groups?page={next}>; rel=\"next\", <{base}/api/v4/groups?page=3>; rel=\"last\"",
            base = state.base_url,
            next = page + 1
        );
        if let Ok(value) = HeaderValue::from_str(&link) {
            response.headers_mut().insert(LINK, value);
        }
    }

    response
}

async fn create_commit(
    State(state): State<GitlabState>,
    Path(project): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    state.commits.lock().await.push((project.clone(), authorization, body));

    if project == "500" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "branch missing" })))
            .into_response();
    }

    (StatusCode::CREATED, Json(json!({ "id": "abc123" }))).into_response()
}

async fn gitlab_server(user_state: &'static str) -> GitlabState {
    let commits = Arc::new(Mutex::new(Vec::new()));
    let captured = commits.clone();
    let base_url = serve(move |base_url| {
        Router::new()
            .route("/api/v4/user", get(user))
            .route("/api/v4/groups", get(groups))
            .route("/api/v4/projects/{project}/repository/commits", post(create_commit))
            .with_state(GitlabState {
                base_url,
                user_state,
                commits: captured,
            })
    })
    .await;

    GitlabState {
        base_url,
        user_state,
        commits,
    }
}

fn connector(base_url: &str, allowed_groups: &[&str], repos: Vec<RepoMapping>) -> SocialGitlab {
    let settings = OAuthProviderSettings {
        enabled: true,
        name: "gitlab".to_owned(),
        api_url: format!("{base_url}/api/v4"),
        auth_url: format!("{base_url}/oauth/authorize"),
        token_url: format!("{base_url}/oauth/token"),
        allowed_groups: allowed_groups.iter().map(|group| (*group).to_owned()).collect(),
        allow_sign_up: true,
        repos,
        ..OAuthProviderSettings::default()
    };
    let base = SocialBase::new(
        "gitlab",
        OAuthClientConfig::from_settings(&settings, "http://localhost:3000/login/gitlab"),
        reqwest::Client::new(),
    )
    .unwrap_or_else(|_| unreachable!());

    SocialGitlab::new(base, &settings)
}

fn repo(base_url: &str, repo_id: i64) -> RepoMapping {
    RepoMapping {
        org_id: OrgId::new(1),
        repo_id,
        branch: "main".to_owned(),
        url: base_url.to_owned(),
        dashboards_path: "grafana/dashboards".to_owned(),
    }
}

fn options(action: DashboardAction) -> UpdateDashboardOptions {
    UpdateDashboardOptions {
        action,
        message: "raise threshold".to_owned(),
        title: "Latency".to_owned(),
        name: "latency".to_owned(),
        dashboard: "{\n  \"title\": \"Latency\"\n}".to_owned(),
        folder: "Ops".to_owned(),
        org_id: OrgId::new(1),
    }
}

#[tokio::test]
async fn groups_follow_link_pagination_across_pages() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &[], Vec::new());

    let groups = gitlab.groups("token").await;

    assert_eq!(groups, vec!["ops", "ops/sre", "platform", "grafana-admins"]);
}

#[tokio::test]
async fn user_info_collects_profile_and_groups() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &["platform"], Vec::new());

    let info = gitlab.user_info(&OAuthToken::bearer("token")).await;

    assert!(info.is_ok_and(|info| {
        info.id == "17"
            && info.login == "jdoe"
            && info.email == "jdoe@example.com"
            && info.groups.len() == 4
    }));
}

#[tokio::test]
async fn inactive_user_is_rejected() {
    let server = gitlab_server("blocked").await;
    let gitlab = connector(&server.base_url, &[], Vec::new());

    let info = gitlab.user_info(&OAuthToken::bearer("token")).await;

    assert!(matches!(info, Err(AppError::IdentityRejected(ref message))
        if message == "user jdoe is inactive"));
}

#[tokio::test]
async fn user_outside_allowed_groups_is_rejected() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &["security"], Vec::new());

    let info = gitlab.user_info(&OAuthToken::bearer("token")).await;

    assert!(matches!(info, Err(AppError::IdentityRejected(ref message))
        if message == &DashboardError::MissingGroupMembership.to_string()));
}

#[tokio::test]
async fn update_dashboard_posts_one_commit_action() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &[], vec![repo(&server.base_url, 42)]);

    let result = gitlab
        .update_dashboard(&options(DashboardAction::Update), "user-token")
        .await;
    assert!(result.is_ok());

    let commits = server.commits.lock().await;
    assert_eq!(commits.len(), 1);
    let (project, authorization, body) = &commits[0];
    assert_eq!(project, "42");
    assert_eq!(authorization.as_deref(), Some("Bearer user-token"));
    assert_eq!(body["branch"], json!("main"));
    assert_eq!(
        body["commit_message"],
        json!("Update Latency dashboard\n\nraise threshold")
    );
    assert_eq!(body["actions"][0]["action"], json!("update"));
    assert_eq!(
        body["actions"][0]["file_path"],
        json!("grafana/dashboards/Ops/latency.json")
    );
    assert_eq!(
        body["actions"][0]["content"],
        json!("{\n  \"title\": \"Latency\"\n}")
    );
}

#[tokio::test]
async fn rejected_commit_collapses_to_sync_failure() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &[], vec![repo(&server.base_url, 500)]);

    let result = gitlab
        .update_dashboard(&options(DashboardAction::Create), "user-token")
        .await;

    assert!(matches!(result, Err(AppError::ExternalSync(ref message))
        if message == &DashboardError::ExternalSyncFailed.to_string()));
}

#[tokio::test]
async fn unmapped_organization_is_a_sync_failure() {
    let server = gitlab_server("active").await;
    let gitlab = connector(&server.base_url, &[], vec![repo(&server.base_url, 42)]);
    let mut options = options(DashboardAction::Delete);
    options.org_id = OrgId::new(9);

    let result = gitlab.update_dashboard(&options, "user-token").await;

    assert!(matches!(result, Err(AppError::ExternalSync(_))));
    assert!(server.commits.lock().await.is_empty());
}

#[test]
fn api_base_url_appends_version_once() {
    assert_eq!(
        api_base_url("https://gitlab.example.com"),
        "https://gitlab.example.com/api/v4"
    );
    assert_eq!(
        api_base_url("https://gitlab.example.com/api/v4/"),
        "https://gitlab.example.com/api/v4"
    );
}

#[test]
fn first_matching_repository_wins() {
    let mut second = repo("https://other.example.com", 7);
    second.branch = "release".to_owned();
    let gitlab = connector(
        "https://gitlab.example.com",
        &[],
        vec![repo("https://gitlab.example.com", 42), second],
    );

    assert!(gitlab.repo(OrgId::new(1)).is_some_and(|repo| repo.repo_id == 42));
    assert!(gitlab.repo(OrgId::new(2)).is_none());
}
