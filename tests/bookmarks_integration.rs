mod helpers;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use bkms::app_state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Client {
    app: Router,
    token: String,
}

impl Client {
    fn new(app: Router, state: &AppState) -> Self {
        let token = state.jwt.generate_token(1, "admin").unwrap();
        Self { app, token }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token));
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body_bytes).unwrap_or(Value::Null))
    }

    async fn upload(&self, uri: &str, file_name: &str, contents: &str) -> (StatusCode, String) {
        let boundary = "integration-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"bookmark_file\"; filename=\"{file_name}\"\r\nContent-Type: text/html\r\n\r\n{contents}\r\n--{boundary}--\r\n"
        );
        let request = Request::post(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body_bytes.to_vec()).unwrap())
    }
}

#[tokio::test]
async fn test_bookmark_lifecycle() {
    let Some(pool) = helpers::setup_test_db().await else {
        return;
    };
    let (app, state) = helpers::test_app(pool);
    let client = Client::new(app, &state);

    let marker = helpers::unique("marker");
    let url = format!("https://{marker}.example.com/post");
    let tag = helpers::unique("tag");

    let (status, body) = client
        .send(
            "POST",
            "/api/v1/bookmark",
            Some(json!({
                "url": url,
                "title": "First title",
                "tags": [{"name": tag}],
                "create_archive": false,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let id = body["data"]["id"].as_i64().unwrap();

    // Same URL again
    let (status, body) = client
        .send("POST", "/api/v1/bookmark", Some(json!({"url": url})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);

    let (status, body) = client
        .send(
            "GET",
            &format!("/api/v1/bookmarks?page=1&keyword={marker}&tags={tag}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["rows"][0]["id"], id);
    assert_eq!(body["data"]["rows"][0]["tags"][0]["name"], tag.as_str());

    let (status, _) = client
        .send(
            "PUT",
            "/api/v1/bookmarks",
            Some(json!({
                "id": id,
                "url": url,
                "title": "Second title",
                "excerpt": "",
                "author": "",
                "tags": [],
                "create_archive": false,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = client
        .send("GET", &format!("/api/v1/bookmark/{id}/content"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Second title");
    assert_eq!(body["data"]["html"], "");

    // The tag lost its only bookmark
    let (_, body) = client
        .send("GET", &format!("/api/v1/tags?name={tag}"), None)
        .await;
    assert_eq!(body["data"][0]["count"], 0);

    let (status, body) = client
        .send("DELETE", "/api/v1/bookmark", Some(json!([id])))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);

    let (status, _) = client
        .send("GET", &format!("/api/v1/bookmark/{id}/content"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tag_rename_conflict_and_prune() {
    let Some(pool) = helpers::setup_test_db().await else {
        return;
    };
    let (app, state) = helpers::test_app(pool);
    let client = Client::new(app, &state);

    let first = helpers::unique("first");
    let second = helpers::unique("second");
    let url = format!("https://{}.example.com/", helpers::unique("tags"));
    let (status, _) = client
        .send(
            "POST",
            "/api/v1/bookmark",
            Some(json!({"url": url, "tags": [{"name": first}, {"name": second}]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = client
        .send("GET", &format!("/api/v1/tags?name={first}"), None)
        .await;
    let first_id = body["data"][0]["id"].as_i64().unwrap();

    let (status, _) = client
        .send(
            "PUT",
            &format!("/api/v1/tag/{first_id}"),
            Some(json!({"name": second})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let renamed = helpers::unique("renamed");
    let (status, _) = client
        .send(
            "PUT",
            &format!("/api/v1/tag/{first_id}"),
            Some(json!({"name": renamed})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client
        .send("DELETE", &format!("/api/v1/tag/{first_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = client
        .send("DELETE", &format!("/api/v1/tag/{first_id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = client.send("DELETE", "/api/v1/tags/orphans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["deleted"].as_u64().is_some());
}

#[tokio::test]
async fn test_import_skips_existing_and_tags_by_folder() {
    let Some(pool) = helpers::setup_test_db().await else {
        return;
    };
    let (app, state) = helpers::test_app(pool);
    let client = Client::new(app, &state);

    let host = helpers::unique("import");
    let folder = helpers::unique("Folder");
    let existing = format!("https://{host}.example.com/b");
    let (status, _) = client
        .send("POST", "/api/v1/bookmark", Some(json!({"url": existing})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let export = format!(
        r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
    <DT><H3>{folder}</H3>
    <DL><p>
        <DT><A HREF="https://{host}.example.com/a" ADD_DATE="1600000000">A</A>
        <DT><A HREF="https://{host}.example.com/b?utm_source=feed" ADD_DATE="1600000000">B</A>
        <DT><A HREF="https://{host}.example.com/c" ADD_DATE="1600000000">C</A>
    </DL><p>
</DL><p>"#
    );

    let (status, stream) = client
        .upload(
            "/api/v1/bookmarks/import?generate_tag=true",
            "bookmarks.html",
            &export,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let events: Vec<Value> = stream
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).unwrap())
        .collect();
    let count = |kind: &str| events.iter().filter(|e| e["type"] == kind).count();

    assert_eq!(count("success"), 2);
    assert_eq!(count("error"), 0);
    let complete = events.last().unwrap();
    assert_eq!(complete["type"], "complete");
    assert_eq!(
        complete["message"],
        "import finished: 2 imported, 1 skipped, 0 failed"
    );

    let (_, body) = client
        .send("GET", &format!("/api/v1/tags?name={folder}"), None)
        .await;
    assert_eq!(body["data"][0]["count"], 2);
}
