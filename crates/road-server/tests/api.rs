//! End-to-end checks through the full router against an in-memory database.

use std::time::Duration;

use axum::Router;
use axum::body::{Body, BodyDataStream, to_bytes};
use axum::http::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use road_auth::hash_password_with_cost;
use road_config::RoadConfig;
use road_core::entities::NewUser;
use road_core::enums::Role;
use road_db::service::RoadService;
use road_server::{AppState, build_router};

const PASSWORD: &str = "correct-horse-battery";

struct TestApp {
    router: Router,
    state: AppState,
    _uploads: TempDir,
}

async fn test_app() -> TestApp {
    let uploads = TempDir::new().unwrap();
    let mut config = RoadConfig::default();
    config.database.path = ":memory:".into();
    config.auth.jwt_secret = "integration-test-secret".into();
    config.uploads.dir = uploads.path().display().to_string();

    let service = RoadService::from_config(&config.database).await.unwrap();
    for (email, role) in [
        ("admin@roads.gov.pg", Role::Admin),
        ("engineer@roads.gov.pg", Role::Engineer),
        ("viewer@roads.gov.pg", Role::Viewer),
    ] {
        let new = NewUser {
            email: email.into(),
            name: format!("{role} user"),
            role,
            password: PASSWORD.into(),
        };
        let hash = hash_password_with_cost(PASSWORD, 4).unwrap();
        service.create_user(None, &new, &hash).await.unwrap();
    }

    let state = AppState::new(service, config).with_password_cost(4);
    TestApp {
        router: build_router(state.clone()),
        state,
        _uploads: uploads,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn login(&self, email: &str) -> String {
        let response = self
            .send(json_request("POST", "/api/auth/login", None, &json!({
                "email": email,
                "password": PASSWORD,
            })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string()
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn create_project(app: &TestApp, token: &str, name: &str) -> String {
    let response = app
        .send(json_request(
            "POST",
            "/api/projects",
            Some(token),
            &json!({ "name": name, "budget": 12_500_000.0, "length_km": 42.5 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_ok_without_auth() {
    let app = test_app().await;
    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn login_returns_token_and_user() {
    let app = test_app().await;
    let response = app
        .send(json_request("POST", "/api/auth/login", None, &json!({
            "email": "  ADMIN@roads.gov.pg ",
            "password": PASSWORD,
        })))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let me = body_json(app.get("/api/auth/me", Some(token)).await).await;
    assert_eq!(me["email"], "admin@roads.gov.pg");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app().await;
    let response = app
        .send(json_request("POST", "/api/auth/login", None, &json!({
            "email": "admin@roads.gov.pg",
            "password": "not-the-password",
        })))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn unknown_email_gets_the_wrong_password_response() {
    let app = test_app().await;
    let unknown = app
        .send(json_request("POST", "/api/auth/login", None, &json!({
            "email": "nobody@roads.gov.pg",
            "password": PASSWORD,
        })))
        .await;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let wrong = app
        .send(json_request("POST", "/api/auth/login", None, &json!({
            "email": "admin@roads.gov.pg",
            "password": "not-the-password",
        })))
        .await;
    assert_eq!(body_json(unknown).await, body_json(wrong).await);
}

#[tokio::test]
async fn demoted_account_loses_write_access_before_token_expiry() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let engineer = app.login("engineer@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Hiritano Highway").await;
    let (user, _) = app
        .state
        .service
        .find_credentials("engineer@roads.gov.pg")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{}", user.id),
            Some(&admin),
            &json!({ "role": "viewer" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(json_request(
            "POST",
            "/api/incidents",
            Some(&engineer),
            &json!({ "project_id": project, "title": "Spill", "severity": "low" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let me = body_json(app.get("/api/auth/me", Some(&engineer)).await).await;
    assert_eq!(me["role"], "viewer");
}

#[tokio::test]
async fn deleted_account_token_is_unauthorized() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let viewer = app.login("viewer@roads.gov.pg").await;
    let (user, _) = app
        .state
        .service
        .find_credentials("viewer@roads.gov.pg")
        .await
        .unwrap()
        .unwrap();

    let response = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{}", user.id))
                .header(AUTHORIZATION, format!("Bearer {admin}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(response.status().is_success());

    assert_eq!(
        app.get("/api/projects", Some(&viewer)).await.status(),
        StatusCode::UNAUTHORIZED
    );
    let stream = app
        .get(&format!("/api/realtime/events?token={viewer}"), None)
        .await;
    assert_eq!(stream.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_or_garbage_token_is_unauthorized() {
    let app = test_app().await;
    assert_eq!(
        app.get("/api/projects", None).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/api/projects", Some("not.a.jwt")).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn viewer_cannot_create_projects() {
    let app = test_app().await;
    let token = app.login("viewer@roads.gov.pg").await;
    let response = app
        .send(json_request(
            "POST",
            "/api/projects",
            Some(&token),
            &json!({ "name": "Okuk Highway" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let list = app.get("/api/projects", Some(&token)).await;
    assert_eq!(list.status(), StatusCode::OK);
}

#[tokio::test]
async fn project_crud_round_trip() {
    let app = test_app().await;
    let token = app.login("admin@roads.gov.pg").await;
    let id = create_project(&app, &token, "Highlands Highway").await;

    let fetched = body_json(app.get(&format!("/api/projects/{id}"), Some(&token)).await).await;
    assert_eq!(fetched["name"], "Highlands Highway");
    assert_eq!(fetched["status"], "planning");

    let updated = app
        .send(json_request(
            "PUT",
            &format!("/api/projects/{id}"),
            Some(&token),
            &json!({ "status": "active" }),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);
    assert_eq!(body_json(updated).await["status"], "active");

    let deleted = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/projects/{id}"))
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(body_json(deleted).await["deleted"], true);

    let gone = app.get(&format!("/api/projects/{id}"), Some(&token)).await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let app = test_app().await;
    let token = app.login("admin@roads.gov.pg").await;

    let blank_name = app
        .send(json_request(
            "POST",
            "/api/projects",
            Some(&token),
            &json!({ "name": "   " }),
        ))
        .await;
    assert_eq!(blank_name.status(), StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/projects")
                .header(CONTENT_TYPE, "application/json")
                .header(AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(malformed).await["error"].is_string());

    let bad_status = app
        .get("/api/projects?status=abandoned", Some(&token))
        .await;
    assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = test_app().await;
    let token = app.login("admin@roads.gov.pg").await;
    let response = app
        .send(json_request(
            "POST",
            "/api/users",
            Some(&token),
            &json!({
                "email": "Engineer@roads.gov.pg",
                "name": "Second engineer",
                "role": "engineer",
                "password": PASSWORD,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn gps_csv_import_then_export() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Magi Highway").await;
    let engineer = app.login("engineer@roads.gov.pg").await;

    let csv = "phase,side,latitude,longitude,distance,notes,elevation,accuracy\n\
               drainage,left,-9.44,147.18,0,Culvert,35.5,3\n\
               paving,right,-9.45,147.19,150,,,\n\
               sealing,center,120.0,147.20,300,,,\n";
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/api/projects/{project}/gps-points/import"))
                .header(AUTHORIZATION, format!("Bearer {engineer}"))
                .header(CONTENT_TYPE, "text/csv")
                .body(Body::from(csv))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/api/projects/{project}/gps-points/import"))
                .header(AUTHORIZATION, format!("Bearer {admin}"))
                .header(CONTENT_TYPE, "text/csv")
                .body(Body::from(csv))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let report = body_json(response).await;
    assert_eq!(report["imported"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["errors"].as_array().unwrap().len(), 1);

    let listed = body_json(
        app.get(&format!("/api/gps-points?project_id={project}"), Some(&engineer))
            .await,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 2);

    let export = app
        .get(
            &format!("/api/projects/{project}/gps-points/export"),
            Some(&engineer),
        )
        .await;
    assert_eq!(export.status(), StatusCode::OK);
    assert!(
        export.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        export.headers()[CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains(&project)
    );
    let text = body_text(export).await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("phase,side,latitude,longitude"));
}

#[tokio::test]
async fn import_into_missing_project_is_not_found() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/projects/prj-missing/gps-points/import")
                .header(AUTHORIZATION, format!("Bearer {admin}"))
                .body(Body::from(
                    "phase,side,latitude,longitude,distance,notes,elevation,accuracy\n",
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn navigation_is_filtered_by_role() {
    let app = test_app().await;
    let viewer = app.login("viewer@roads.gov.pg").await;
    let admin = app.login("admin@roads.gov.pg").await;

    let viewer_items = body_json(app.get("/api/navigation", Some(&viewer)).await).await;
    let admin_items = body_json(app.get("/api/navigation", Some(&admin)).await).await;

    let hrefs = |items: &Value| -> Vec<String> {
        items
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["href"].as_str().unwrap().to_string())
            .collect()
    };
    let viewer_hrefs = hrefs(&viewer_items);
    assert!(viewer_hrefs.contains(&"/projects".to_string()));
    assert!(!viewer_hrefs.contains(&"/admin/users".to_string()));
    assert!(hrefs(&admin_items).contains(&"/admin/users".to_string()));
    assert!(admin_items.as_array().unwrap().len() > viewer_items.as_array().unwrap().len());
}

#[tokio::test]
async fn settings_are_readable_by_all_and_writable_by_admin() {
    let app = test_app().await;
    let viewer = app.login("viewer@roads.gov.pg").await;
    let admin = app.login("admin@roads.gov.pg").await;

    let settings = app.get("/api/settings", Some(&viewer)).await;
    assert_eq!(settings.status(), StatusCode::OK);

    let body = json!({ "value": "PNG Roads" });
    let denied = app
        .send(json_request("PUT", "/api/settings/site_name", Some(&viewer), &body))
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let saved = app
        .send(json_request("PUT", "/api/settings/site_name", Some(&admin), &body))
        .await;
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(body_json(saved).await["value"], "PNG Roads");
}

#[tokio::test]
async fn mutations_land_in_the_activity_log() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Ramu Highway").await;

    let log = body_json(
        app.get(
            &format!("/api/activity-log?entity_type=project&entity_id={project}"),
            Some(&admin),
        )
        .await,
    )
    .await;
    let entries = log.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "created");
}

fn multipart_body(boundary: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"site.png\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

fn upload_request(token: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "roadtrack-test-boundary";
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(boundary, content_type, data)))
        .unwrap()
}

#[tokio::test]
async fn upload_stores_and_serves_the_file() {
    let app = test_app().await;
    let engineer = app.login("engineer@roads.gov.pg").await;
    let data = b"\x89PNG\r\n\x1a\nnot-really-an-image";

    let response = app.send(upload_request(&engineer, "image/png", data)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["size"], data.len());
    assert_eq!(body["contentType"], "image/png");

    let served = app.get(&url, None).await;
    assert_eq!(served.status(), StatusCode::OK);
    let bytes = to_bytes(served.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], &data[..]);
}

#[tokio::test]
async fn upload_rejects_disallowed_types_and_viewers() {
    let app = test_app().await;
    let engineer = app.login("engineer@roads.gov.pg").await;
    let viewer = app.login("viewer@roads.gov.pg").await;

    let pdf = app
        .send(upload_request(&engineer, "application/pdf", b"%PDF-1.7"))
        .await;
    assert_eq!(pdf.status(), StatusCode::BAD_REQUEST);

    let denied = app.send(upload_request(&viewer, "image/png", b"png")).await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

async fn next_frame(body: &mut BodyDataStream) -> String {
    let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
        .await
        .expect("frame within timeout")
        .expect("stream still open")
        .unwrap();
    String::from_utf8(chunk.to_vec()).unwrap()
}

/// Parse a `data: <json>` frame.
fn frame_event(frame: &str) -> Value {
    let data = frame
        .trim_end()
        .strip_prefix("data: ")
        .expect("frame carries a data field");
    serde_json::from_str(data).unwrap()
}

/// Open an event stream and consume its `connected` frame.
async fn open_stream(app: &TestApp, token: &str, project: Option<&str>) -> BodyDataStream {
    let uri = match project {
        Some(project) => format!("/api/realtime/events?token={token}&project_id={project}"),
        None => format!("/api/realtime/events?token={token}"),
    };
    let response = app.get(&uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let mut body = response.into_body().into_data_stream();
    assert_eq!(frame_event(&next_frame(&mut body).await)["type"], "connected");
    body
}

async fn assert_silent(body: &mut BodyDataStream) {
    let next = tokio::time::timeout(Duration::from_millis(200), body.next()).await;
    assert!(next.is_err(), "unexpected frame: {next:?}");
}

#[tokio::test]
async fn unscoped_stream_receives_project_scoped_gps_points() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Wau Road").await;
    let other = create_project(&app, &admin, "Bulolo Road").await;

    let mut dashboard = open_stream(&app, &admin, None).await;
    let mut elsewhere = open_stream(&app, &admin, Some(&other)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/gps-points",
            Some(&admin),
            &json!({
                "project_id": project,
                "phase": "drainage",
                "side": "left",
                "latitude": -7.34,
                "longitude": 146.71,
                "distance": 250.0,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let point_id = body_json(response).await["id"].clone();

    let event = frame_event(&next_frame(&mut dashboard).await);
    assert_eq!(event["type"], "gps_point_added");
    assert_eq!(event["projectId"], project.as_str());
    assert_eq!(event["data"]["id"], point_id);

    assert_silent(&mut elsewhere).await;
}

#[tokio::test]
async fn project_creation_reaches_every_stream() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let existing = create_project(&app, &admin, "Kokoda Road").await;

    let mut scoped = open_stream(&app, &admin, Some(&existing)).await;
    let mut dashboard = open_stream(&app, &admin, None).await;

    let created = create_project(&app, &admin, "Lae Nadzab Road").await;

    for body in [&mut scoped, &mut dashboard] {
        let event = frame_event(&next_frame(body).await);
        assert_eq!(event["type"], "project_update");
        assert_eq!(event["data"]["id"], created.as_str());
        assert!(event.get("projectId").is_none());
    }
}

#[tokio::test]
async fn construction_activity_changes_emit_activity_updates() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let engineer = app.login("engineer@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Madang Coastal Road").await;
    let mut stream = open_stream(&app, &admin, Some(&project)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/construction-activities",
            Some(&engineer),
            &json!({
                "project_id": project,
                "name": "Culvert installation",
                "phase": "drainage",
                "progress_percent": 10.0,
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let activity_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let event = frame_event(&next_frame(&mut stream).await);
    assert_eq!(event["type"], "activity_update");
    assert_eq!(event["projectId"], project.as_str());
    assert_eq!(event["data"]["id"], activity_id.as_str());

    let response = app
        .send(json_request(
            "PUT",
            &format!("/api/construction-activities/{activity_id}"),
            Some(&engineer),
            &json!({ "progress_percent": 65.0 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let event = frame_event(&next_frame(&mut stream).await);
    assert_eq!(event["type"], "activity_update");
    assert_eq!(event["data"]["progress_percent"], 65.0);
}

#[tokio::test]
async fn reported_incident_emits_a_notification() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let engineer = app.login("engineer@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Mendi Road").await;
    let mut stream = open_stream(&app, &admin, Some(&project)).await;

    let response = app
        .send(json_request(
            "POST",
            "/api/incidents",
            Some(&engineer),
            &json!({
                "project_id": project,
                "title": "Landslip across the work zone",
                "severity": "high",
            }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let incident_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let event = frame_event(&next_frame(&mut stream).await);
    assert_eq!(event["type"], "notification");
    assert_eq!(event["projectId"], project.as_str());
    assert_eq!(event["data"]["severity"], "high");
    assert_eq!(event["data"]["message"], "Landslip across the work zone");
    assert_eq!(event["data"]["incidentId"], incident_id.as_str());
}

#[tokio::test]
async fn event_stream_connects_and_receives_scoped_events() {
    let app = test_app().await;
    let admin = app.login("admin@roads.gov.pg").await;
    let project = create_project(&app, &admin, "Hiritano Highway").await;

    // Query-string token, the way a browser EventSource connects.
    let response = app
        .get(
            &format!("/api/realtime/events?token={admin}&project_id={project}"),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );
    let mut body = response.into_body().into_data_stream();

    let connected = next_frame(&mut body).await;
    assert!(connected.starts_with("data: "));
    assert!(connected.contains("\"connected\""));
    assert_eq!(app.state.registry.len(), 1);

    let updated = app
        .send(json_request(
            "PUT",
            &format!("/api/projects/{project}"),
            Some(&admin),
            &json!({ "description": "Sealing the coastal section" }),
        ))
        .await;
    assert_eq!(updated.status(), StatusCode::OK);

    let frame = next_frame(&mut body).await;
    assert!(frame.contains("\"project_update\""));
    assert!(frame.contains("Sealing the coastal section"));

    drop(body);
}

#[tokio::test]
async fn event_stream_requires_a_token() {
    let app = test_app().await;
    let response = app.get("/api/realtime/events", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.registry.len(), 0);
}
