use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cosearch_api::{router, AppState};
use cosearch_core::{Notifier, Settings};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    router: Router,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            db_path: dir.path().join("catalog.sqlite3"),
            ..Settings::default()
        };
        let router = router(AppState::new(settings, Notifier::Disabled));
        Self { _dir: dir, router }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    async fn contributor(&self, local_handle: &str) -> i64 {
        let (status, body) = self
            .post("/contributors", json!({ "local_handle": local_handle }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn contribution(&self, body: Value) -> String {
        let (status, body) = self.post("/contributions", body).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

fn contribution_body(title: &str) -> Value {
    json!({
        "title": title,
        "short_title": title,
        "date": "2021-01-01T00:00:00",
        "description": "",
        "links": [],
        "contributors": [],
        "tags": [],
    })
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn contributor_collisions_return_417_with_detail() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/contributors",
            json!({ "local_handle": "cosmo", "display_name": "Tristan" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let cases = [
        (json!({ "local_handle": "cosmo" }), "Local handle already exists"),
        (
            json!({ "local_handle": "Tristan" }),
            "Local handle already used as display name",
        ),
        (
            json!({ "local_handle": "x", "display_name": "Tristan" }),
            "Display name already exists",
        ),
        (
            json!({ "local_handle": "y", "display_name": "cosmo" }),
            "Display name already used as local handle",
        ),
    ];
    for (payload, detail) in cases {
        let (status, body) = app.post("/contributors", payload).await;
        assert_eq!(status, StatusCode::EXPECTATION_FAILED);
        assert_eq!(body, json!({ "detail": detail }));
    }
}

#[tokio::test]
async fn contributor_can_be_updated_with_its_own_names() {
    let app = TestApp::new();
    let (_, created) = app
        .post(
            "/contributors",
            json!({ "local_handle": "cosmo", "display_name": "Tristan" }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .put(
            &format!("/contributors/{id}"),
            json!({ "local_handle": "cosmo", "display_name": "Tristan", "website": "" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["website"], Value::Null);

    let (status, body) = app.get("/contributors/local_handle/cosmo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(id));
    assert_eq!(body["reviewed_contributions"], json!([]));
}

#[tokio::test]
async fn missing_contributor_is_400() {
    let app = TestApp::new();
    let (status, body) = app.get("/contributors/99").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Contributor cannot be found." }));
}

#[tokio::test]
async fn contribution_contributor_order_follows_last_write() {
    let app = TestApp::new();
    let a = app.contributor("a").await;
    let b = app.contributor("b").await;

    let mut body = contribution_body("Ordered");
    body["contributors"] = json!([a, b]);
    let id = app.contribution(body.clone()).await;

    body["contributors"] = json!([b, a]);
    let (status, updated) = app.put(&format!("/contributions/{id}"), body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["contributors"][0]["id"], json!(b));

    let (status, contributors) = app.get(&format!("/contributions/{id}/contributors")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = contributors
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![b, a]);
}

#[tokio::test]
async fn unknown_tag_fails_create_and_persists_nothing() {
    let app = TestApp::new();
    let mut body = contribution_body("Broken");
    body["tags"] = json!([42]);

    let (status, detail) = app.post("/contributions", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(detail, json!({ "detail": "Tag ID 42 cannot be found." }));

    let (_, list) = app.get("/contributions").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn children_endpoint_lists_dependents_with_leaf_dependencies() {
    let app = TestApp::new();
    let x = app.contribution(contribution_body("X")).await;
    let mut body = contribution_body("Y");
    body["dependencies"] = json!([x]);
    let y = app.contribution(body).await;

    let (status, children) = app.get(&format!("/contributions/{x}/children")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children[0]["id"], json!(y));
    assert_eq!(
        children[0]["dependencies"],
        json!([{ "id": x, "title": "X", "short_title": "X" }])
    );

    let (status, _) = app.get("/contributions/nothere0/children").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reviewed_contributions_endpoint() {
    let app = TestApp::new();
    let reviewer = app.contributor("reviewer").await;
    let reviewed = app.contribution(contribution_body("Reviewed")).await;
    app.contribution(contribution_body("Other")).await;

    let (status, review) = app
        .post(
            "/reviews",
            json!({
                "contribution_id": reviewed,
                "reviewers": [reviewer],
                "link": "https://example.com/review",
                "notes": "ok",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["reviewers"][0]["local_handle"], "reviewer");

    let (status, body) = app
        .get(&format!("/contributors/{reviewer}/reviewed_contributions"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["reviewed_contributions"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(reviewed));
}

#[tokio::test]
async fn tag_lifecycle_and_delete_message() {
    let app = TestApp::new();
    let (status, tag) = app
        .post("/tags", json!({ "display_name": "Meta", "color": "#1f2937" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = tag["id"].as_i64().unwrap();

    let (status, body) = app
        .post("/tags", json!({ "display_name": "Meta", "color": "#000000" }))
        .await;
    assert_eq!(status, StatusCode::EXPECTATION_FAILED);
    assert_eq!(body["detail"], "Display name already exists");

    let (status, view) = app.get(&format!("/tags/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["contributions"], json!([]));

    let (status, body) = app.delete(&format!("/tags/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Tag deleted successfully" }));

    let (status, body) = app.delete(&format!("/tags/{id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Tag cannot be found." }));
}

#[tokio::test]
async fn review_delete_returns_message() {
    let app = TestApp::new();
    let contribution = app.contribution(contribution_body("C")).await;
    let (_, review) = app
        .post(
            "/reviews",
            json!({
                "contribution_id": contribution,
                "reviewers": [],
                "link": "l",
                "notes": "n",
            }),
        )
        .await;
    let id = review["id"].as_i64().unwrap();

    let (status, body) = app.delete(&format!("/reviews/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Review deleted successfully" }));

    let (status, body) = app.get(&format!("/reviews/{id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], format!("Review ID {id} cannot be found."));
}

#[tokio::test]
async fn invalid_url_is_422() {
    let app = TestApp::new();
    let mut body = contribution_body("Bad link");
    body["github_link"] = json!("not a url");
    let (status, body) = app.post("/contributions", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("github_link"));
}

#[tokio::test]
async fn malformed_body_is_422() {
    let app = TestApp::new();
    let (status, body) = app.post("/tags", json!({ "color": "#fff" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn list_endpoints_honor_skip_and_limit() {
    let app = TestApp::new();
    for handle in ["a", "b", "c"] {
        app.contributor(handle).await;
    }
    let (status, body) = app.get("/contributors?skip=1&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["local_handle"], "b");
}

#[tokio::test]
async fn contribution_dates_accept_common_iso_forms() {
    let app = TestApp::new();
    for input in [
        "2021-01-01 00:00:00",
        "2021-01-01T00:00:00Z",
        "2021-01-01T00:00:00.000Z",
        "2021-01-01T01:00:00+01:00",
        "2021-01-01",
    ] {
        let mut body = contribution_body("Dated");
        body["date"] = json!(input);
        let (status, created) = app.post("/contributions", body).await;
        assert_eq!(status, StatusCode::OK, "{input}: {created}");
        assert_eq!(created["date"], "2021-01-01T00:00:00", "{input}");
    }
}

#[tokio::test]
async fn archived_at_accepts_space_separator_and_rejects_garbage() {
    let app = TestApp::new();
    let mut body = contribution_body("Archived");
    body["archived_at"] = json!("2022-06-30 12:00:00");
    let (status, created) = app.post("/contributions", body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["archived_at"], "2022-06-30T12:00:00");

    body["archived_at"] = json!("last summer");
    let (status, detail) = app.post("/contributions", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(detail["detail"].as_str().unwrap().contains("archived_at"));
}

#[tokio::test]
async fn timestamps_are_rendered_as_utc_instants() {
    let app = TestApp::new();
    let (_, contributor) = app
        .post("/contributors", json!({ "local_handle": "stamp" }))
        .await;
    let created_at = contributor["created_at"].as_str().unwrap();
    assert!(created_at.ends_with('Z'), "{created_at}");
    assert_eq!(created_at.len(), "2021-01-01T00:00:00.000Z".len());
}

#[tokio::test]
async fn review_update_with_unknown_reviewer_is_400() {
    let app = TestApp::new();
    let reviewer = app.contributor("reviewer").await;
    let contribution = app.contribution(contribution_body("C")).await;
    let (_, review) = app
        .post(
            "/reviews",
            json!({
                "contribution_id": contribution,
                "reviewers": [reviewer],
                "link": "l",
                "notes": "n",
            }),
        )
        .await;
    let id = review["id"].as_i64().unwrap();

    let (status, body) = app
        .put(
            &format!("/reviews/{id}"),
            json!({
                "contribution_id": contribution,
                "reviewers": [reviewer, 999],
                "link": "l",
                "notes": "changed",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Reviewer ID 999 cannot be found." }));

    let (_, stored) = app.get(&format!("/reviews/{id}")).await;
    assert_eq!(stored["notes"], "n");
    assert_eq!(stored["reviewers"][0]["id"], json!(reviewer));

    let (status, body) = app
        .put(
            &format!("/reviews/{id}"),
            json!({
                "contribution_id": "gone0001",
                "reviewers": [],
                "link": "l",
                "notes": "n",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "detail": "Contribution ID gone0001 cannot be found." }));
}

#[tokio::test]
async fn malformed_path_and_query_use_detail_envelope() {
    let app = TestApp::new();
    let (status, body) = app.get("/tags/abc").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string(), "{body}");

    let (status, body) = app.get("/contributions?skip=-1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].is_string(), "{body}");
}
