use std::{collections::HashMap, sync::Arc};

use super::*;
use crate::test_fakes::session;
use axum::{
    extract::{Path, State},
    http::StatusCode as HttpStatus,
    response::{IntoResponse, Response as HttpResponse},
    routing::get,
    Json, Router,
};
use shared::{domain::Role, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct DirectoryState {
    users: Arc<HashMap<String, Session>>,
    branding: Arc<HashMap<String, UserBranding>>,
    branding_requests: Arc<Mutex<Vec<String>>>,
}

async fn handle_user(
    State(state): State<DirectoryState>,
    Path(id): Path<String>,
) -> HttpResponse {
    if id == "broken" {
        return (HttpStatus::BAD_GATEWAY, "upstream down").into_response();
    }
    match state.users.get(&id) {
        Some(user) => Json(UserLookupResponse { user: user.clone() }).into_response(),
        None => (
            HttpStatus::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, format!("no user {id}"))),
        )
            .into_response(),
    }
}

async fn handle_branding(
    State(state): State<DirectoryState>,
    Path(owner): Path<String>,
) -> HttpResponse {
    state.branding_requests.lock().await.push(owner.clone());
    match state.branding.get(&owner) {
        Some(branding) => Json(BrandingLookupResponse {
            owner_id: UserId::new(owner.clone()),
            branding: Some(branding.clone()),
        })
        .into_response(),
        None => HttpStatus::NOT_FOUND.into_response(),
    }
}

async fn spawn_directory_server(state: DirectoryState) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/api/users/:id", get(handle_user))
        .route("/api/users/:id/branding", get(handle_branding))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/api/"))
}

fn acme_branding() -> UserBranding {
    UserBranding {
        company_name: Some("Acme Vistorias".to_string()),
        primary_color: Some("#ff6600".to_string()),
        ..UserBranding::default()
    }
}

fn seeded_state() -> DirectoryState {
    let admin = session("admin-1", Role::Admin);
    let mut employee = session("emp-1", Role::Employee);
    employee.created_by = Some(UserId::new("admin-1"));
    let orphan = session("emp-2", Role::Employee);

    DirectoryState {
        users: Arc::new(HashMap::from([
            ("admin-1".to_string(), admin),
            ("emp-1".to_string(), employee),
            ("emp-2".to_string(), orphan),
        ])),
        branding: Arc::new(HashMap::from([("admin-1".to_string(), acme_branding())])),
        branding_requests: Arc::default(),
    }
}

#[tokio::test]
async fn fetches_user_record() {
    let state = seeded_state();
    let base = spawn_directory_server(state).await.expect("spawn server");
    let directory = HttpDirectory::new(&base).expect("directory");

    let user = directory
        .fetch_user(&UserId::new("emp-1"))
        .await
        .expect("user");
    assert_eq!(user.id, UserId::new("emp-1"));
    assert_eq!(user.created_by, Some(UserId::new("admin-1")));
}

#[tokio::test]
async fn employee_branding_comes_from_creator() {
    let state = seeded_state();
    let requests = state.branding_requests.clone();
    let base = spawn_directory_server(state).await.expect("spawn server");
    let directory = HttpDirectory::with_timeout(&base, Duration::from_secs(5)).expect("directory");

    let employee = directory
        .fetch_user(&UserId::new("emp-1"))
        .await
        .expect("user");
    let branding = directory.fetch_branding(&employee).await.expect("branding");
    assert_eq!(branding, Some(acme_branding()));
    assert_eq!(*requests.lock().await, vec!["admin-1".to_string()]);
}

#[tokio::test]
async fn missing_branding_is_none() {
    let base = spawn_directory_server(seeded_state())
        .await
        .expect("spawn server");
    let directory = HttpDirectory::new(&base).expect("directory");

    let orphan = session("emp-2", Role::Employee);
    assert_eq!(directory.fetch_branding(&orphan).await.expect("branding"), None);
}

#[tokio::test]
async fn api_errors_surface_as_directory_exceptions() {
    let base = spawn_directory_server(seeded_state())
        .await
        .expect("spawn server");
    let directory = HttpDirectory::new(&base).expect("directory");

    let err = directory
        .fetch_user(&UserId::new("ghost"))
        .await
        .expect_err("unknown user");
    let exception = err
        .downcast_ref::<DirectoryException>()
        .expect("directory exception");
    assert_eq!(exception.status, 404);
    assert_eq!(exception.code, ErrorCode::NotFound);
    assert_eq!(exception.message, "no user ghost");

    let err = directory
        .fetch_user(&UserId::new("broken"))
        .await
        .expect_err("bad gateway");
    let exception = err
        .downcast_ref::<DirectoryException>()
        .expect("directory exception");
    assert_eq!(exception.code, ErrorCode::Unavailable);
    assert_eq!(exception.message, "upstream down");
}

#[tokio::test]
async fn unreachable_directory_is_an_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let directory = HttpDirectory::with_timeout(&format!("http://{addr}"), Duration::from_secs(2))
        .expect("directory");
    assert!(directory.fetch_user(&UserId::new("u1")).await.is_err());
}

#[test]
fn rejects_urls_that_cannot_be_a_base() {
    assert!(HttpDirectory::new("not a url").is_err());
    assert!(HttpDirectory::new("mailto:ops@example.com").is_err());
}

#[test]
fn endpoint_joins_segments_onto_base_path() {
    let directory = HttpDirectory::new("https://directory.example.com/v1/").expect("directory");
    let url = directory
        .endpoint(&["users", "a b", "branding"])
        .expect("endpoint");
    assert_eq!(
        url.as_str(),
        "https://directory.example.com/v1/users/a%20b/branding"
    );

    let bare = HttpDirectory::new("https://directory.example.com").expect("directory");
    assert_eq!(
        bare.endpoint(&["users", "u1"]).expect("endpoint").as_str(),
        "https://directory.example.com/users/u1"
    );
}
