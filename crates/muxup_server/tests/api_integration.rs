//! Integration tests for the muxup admin HTTP API.

mod support;

use axum::body::Bytes;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use muxup_server::handlers::webhook::sign_payload;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use support::{configured, setup_test_server, setup_test_server_with, MuxCall};

async fn create_asset(server: &TestServer, body: Value) -> Value {
    let response = server.post("/mux-video-uploader/mux-asset").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()
}

#[tokio::test]
async fn test_index_reports_ok() {
    let (server, _temp, _mux) = setup_test_server();

    for path in ["/mux-video-uploader", "/mux-video-uploader/"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>(), json!({ "message": "ok" }));
    }
}

#[tokio::test]
async fn test_asset_lifecycle() {
    let (server, _temp, _mux) = setup_test_server();

    let created = create_asset(&server, json!({ "title": "First clip" })).await;
    let id = created["id"].as_u64().expect("id");
    assert_eq!(created["isReady"], json!(false));

    let fetched = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await;
    assert_eq!(fetched.status_code(), StatusCode::OK);
    assert_eq!(fetched.json::<Value>()["title"], "First clip");

    let updated = server
        .put(&format!("/mux-video-uploader/mux-asset/{}", id))
        .json(&json!({ "id": id, "title": "Renamed", "isReady": true }))
        .await;
    assert_eq!(updated.status_code(), StatusCode::OK);
    let updated = updated.json::<Value>();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["isReady"], json!(true));

    let deleted = server
        .delete(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);
    assert_eq!(deleted.json::<Value>()["id"], json!(id));

    let missing = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_find_pages_and_counts_the_filtered_set() {
    let (server, _temp, _mux) = setup_test_server();
    for n in 1..=12 {
        create_asset(&server, json!({ "title": format!("clip {}", n) })).await;
    }
    create_asset(&server, json!({ "title": "other" })).await;

    let page = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("start", 0)
        .add_query_param("limit", 10)
        .add_query_param("filter", "title:CLIP")
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
    let page = page.json::<Value>();
    assert_eq!(page["items"].as_array().expect("items").len(), 10);
    assert_eq!(page["totalCount"], json!(12));

    let second = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("start", 10)
        .add_query_param("limit", 10)
        .add_query_param("filter", "title:clip")
        .await
        .json::<Value>();
    assert_eq!(second["items"].as_array().expect("items").len(), 2);
    assert_eq!(second["totalCount"], json!(12));

    let narrowed = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("filter", "title:clip 1")
        .await
        .json::<Value>();
    // clip 1, clip 10, clip 11, clip 12
    assert_eq!(narrowed["totalCount"], json!(4));

    let count = server
        .get("/mux-video-uploader/mux-asset/count")
        .add_query_param("filter", "title:clip 1")
        .await;
    assert_eq!(count.status_code(), StatusCode::OK);
    assert_eq!(count.json::<Value>(), json!(4));
}

#[tokio::test]
async fn test_find_orders_and_ignores_unknown_filter_fields() {
    let (server, _temp, _mux) = setup_test_server();
    create_asset(&server, json!({ "title": "bravo" })).await;
    create_asset(&server, json!({ "title": "alpha" })).await;
    create_asset(&server, json!({ "title": "charlie" })).await;

    let by_title = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("sort", "title")
        .add_query_param("order", "asc")
        .await
        .json::<Value>();
    let titles: Vec<&str> = by_title["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|item| item["title"].as_str())
        .collect();
    assert_eq!(titles, ["alpha", "bravo", "charlie"]);

    let newest_first = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("sort", "id")
        .add_query_param("order", "DESC")
        .await
        .json::<Value>();
    assert_eq!(newest_first["items"][0]["id"], json!(3));

    let unfiltered = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("filter", "password:hunter2")
        .await
        .json::<Value>();
    assert_eq!(unfiltered["totalCount"], json!(3));
}

#[tokio::test]
async fn test_filter_by_asset_id_matches_only_that_record() {
    let (server, _temp, _mux) = setup_test_server();
    create_asset(&server, json!({ "title": "with id", "asset_id": "abc123" })).await;
    create_asset(&server, json!({ "title": "other", "asset_id": "zzz999" })).await;
    create_asset(&server, json!({ "title": "pending" })).await;

    let page = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("filter", "asset_id:abc123")
        .await
        .json::<Value>();
    let items = page["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "with id");
    assert_eq!(page["totalCount"], json!(1));
}

#[tokio::test]
async fn test_update_only_touches_title_and_readiness() {
    let (server, _temp, _mux) = setup_test_server();
    let created = create_asset(
        &server,
        json!({ "title": "clip", "asset_id": "keep-me", "upload_id": "up-1" }),
    )
    .await;
    let id = created["id"].as_u64().expect("id");

    let response = server
        .put(&format!("/mux-video-uploader/mux-asset/{}", id))
        .json(&json!({
            "id": 999,
            "asset_id": "hijacked",
            "error_message": "injected",
            "isReady": true
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["id"], json!(id));
    assert_eq!(updated["title"], "clip");
    assert_eq!(updated["asset_id"], "keep-me");
    assert_eq!(updated["error_message"], Value::Null);
    assert_eq!(updated["isReady"], json!(true));

    let not_found = server
        .put("/mux-video-uploader/mux-asset/999")
        .json(&json!({ "title": "ghost" }))
        .await;
    assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_accepts_multipart_fields() {
    let (server, _temp, _mux) = setup_test_server();
    let created = create_asset(&server, json!({ "title": "clip" })).await;
    let id = created["id"].as_u64().expect("id");

    let form = MultipartForm::new()
        .add_text("title", "From form")
        .add_text("isReady", "true");
    let response = server
        .put(&format!("/mux-video-uploader/mux-asset/{}", id))
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["title"], "From form");
    assert_eq!(updated["isReady"], json!(true));

    let bad = server
        .put(&format!("/mux-video-uploader/mux-asset/{}", id))
        .multipart(MultipartForm::new().add_text("isReady", "perhaps"))
        .await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_accepts_multipart_data_part_and_ignores_files() {
    let (server, _temp, _mux) = setup_test_server();

    let form = MultipartForm::new()
        .add_text("data", r#"{"title":"Multipart clip"}"#)
        .add_part(
            "files.video",
            Part::bytes(vec![0u8; 32])
                .file_name("clip.mp4")
                .mime_type("video/mp4"),
        );
    let response = server
        .post("/mux-video-uploader/mux-asset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["title"], "Multipart clip");

    let missing_data = server
        .post("/mux-video-uploader/mux-asset")
        .multipart(MultipartForm::new().add_text("title", "no data part"))
        .await;
    assert_eq!(missing_data.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_requires_title() {
    let (server, _temp, _mux) = setup_test_server();
    let response = server
        .post("/mux-video-uploader/mux-asset")
        .json(&json!({ "title": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_remote_upload_creates_mux_asset_and_record() {
    let (server, _temp, mux) = setup_test_server();

    let form = MultipartForm::new()
        .add_text("title", "Remote clip")
        .add_text("url", "https://videos.example.test/clip.mp4");
    let response = server
        .post("/mux-video-uploader/submitRemoteUpload")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let record = response.json::<Value>();
    assert_eq!(record["title"], "Remote clip");
    assert_eq!(record["asset_id"], "remote-asset-1");
    assert_eq!(record["isReady"], json!(false));

    assert_eq!(
        mux.calls(),
        vec![MuxCall::CreateAsset {
            input_url: "https://videos.example.test/clip.mp4".to_string()
        }]
    );
}

#[tokio::test]
async fn test_remote_upload_without_url_is_rejected_before_mux() {
    let (server, _temp, mux) = setup_test_server();

    let form = MultipartForm::new()
        .add_text("title", "No media")
        .add_text("url", "");
    let response = server
        .post("/mux-video-uploader/submitRemoteUpload")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(mux.calls().is_empty());
}

#[tokio::test]
async fn test_direct_upload_returns_ticket() {
    let (server, _temp, mux) = setup_test_server();

    let response = server
        .post("/mux-video-uploader/submitDirectUpload")
        .multipart(MultipartForm::new().add_text("title", "Local clip"))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let ticket = response.json::<Value>();
    assert_eq!(ticket["upload_id"], "upload-1");
    assert_eq!(ticket["url"], "https://storage.example.test/upload-1");
    assert_eq!(ticket["asset"]["upload_id"], "upload-1");
    assert_eq!(ticket["asset"]["title"], "Local clip");

    assert_eq!(
        mux.calls(),
        vec![MuxCall::CreateDirectUpload {
            cors_origin: "*".to_string()
        }]
    );
}

#[tokio::test]
async fn test_uploads_require_mux_credentials() {
    let (server, _temp, mux) = setup_test_server_with(|config| config);

    let response = server
        .post("/mux-video-uploader/submitDirectUpload")
        .multipart(MultipartForm::new().add_text("title", "Local clip"))
        .await;
    assert_eq!(response.status_code(), StatusCode::PRECONDITION_FAILED);
    assert!(mux.calls().is_empty());
}

#[tokio::test]
async fn test_settings_round_trip_enables_uploads() {
    let (server, _temp, mux) = setup_test_server_with(|config| config);

    let before = server.get("/mux-video-uploader/mux-settings").await;
    assert_eq!(before.status_code(), StatusCode::OK);
    assert_eq!(before.json::<Value>(), json!({ "configured": false }));

    let incomplete = server
        .post("/mux-video-uploader/mux-settings")
        .multipart(MultipartForm::new().add_text("access_token", "id"))
        .await;
    assert_eq!(incomplete.status_code(), StatusCode::BAD_REQUEST);

    let form = MultipartForm::new()
        .add_text("access_token", "id")
        .add_text("secret_key", "secret")
        .add_text("webhook_signing_secret", "");
    let saved = server
        .post("/mux-video-uploader/mux-settings")
        .multipart(form)
        .await;
    assert_eq!(saved.status_code(), StatusCode::OK);
    assert_eq!(saved.json::<Value>(), json!({ "configured": true }));

    let after = server.get("/mux-video-uploader/mux-settings").await;
    assert_eq!(after.json::<Value>(), json!({ "configured": true }));

    let upload = server
        .post("/mux-video-uploader/submitDirectUpload")
        .multipart(MultipartForm::new().add_text("title", "Now allowed"))
        .await;
    assert_eq!(upload.status_code(), StatusCode::OK);
    assert_eq!(mux.calls().len(), 1);
}

#[tokio::test]
async fn test_delete_mux_asset_removes_remote_then_local() {
    let (server, _temp, mux) = setup_test_server();
    let created = create_asset(
        &server,
        json!({ "title": "clip", "asset_id": "asset-7", "upload_id": "up-7" }),
    )
    .await;
    let id = created["id"].as_u64().expect("id");

    let form = MultipartForm::new()
        .add_text("id", id.to_string())
        .add_text("asset_id", "asset-7")
        .add_text("upload_id", "up-7")
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({ "success": true, "deletedOnMux": true })
    );
    assert_eq!(
        mux.calls(),
        vec![MuxCall::DeleteAsset {
            asset_id: "asset-7".to_string()
        }]
    );

    let gone = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await;
    assert_eq!(gone.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_mux_asset_cancels_pending_upload() {
    let (server, _temp, mux) = setup_test_server();
    let created = create_asset(&server, json!({ "title": "clip", "upload_id": "up-8" })).await;
    let id = created["id"].as_u64().expect("id");

    let form = MultipartForm::new()
        .add_text("id", id.to_string())
        .add_text("asset_id", "")
        .add_text("upload_id", "up-8")
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        mux.calls(),
        vec![MuxCall::CancelUpload {
            upload_id: "up-8".to_string()
        }]
    );
}

#[tokio::test]
async fn test_delete_mux_asset_keeps_record_when_mux_fails() {
    let (server, _temp, mux) = setup_test_server();
    let created = create_asset(&server, json!({ "title": "clip", "asset_id": "asset-9" })).await;
    let id = created["id"].as_u64().expect("id");
    mux.fail_next("service unavailable");

    let form = MultipartForm::new()
        .add_text("id", id.to_string())
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_GATEWAY);

    let still_there = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await;
    assert_eq!(still_there.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_mux_asset_unknown_record_is_not_found() {
    let (server, _temp, mux) = setup_test_server();
    let form = MultipartForm::new()
        .add_text("id", "42")
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(mux.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_query_and_path_return_json_errors() {
    let (server, _temp, _mux) = setup_test_server();

    let bad_start = server
        .get("/mux-video-uploader/mux-asset")
        .add_query_param("start", "abc")
        .await;
    assert_eq!(bad_start.status_code(), StatusCode::BAD_REQUEST);
    assert!(bad_start.json::<Value>()["error"].is_string());

    let bad_id = server.get("/mux-video-uploader/mux-asset/abc").await;
    assert_eq!(bad_id.status_code(), StatusCode::BAD_REQUEST);
    assert!(bad_id.json::<Value>()["error"].is_string());

    let bad_update = server
        .put("/mux-video-uploader/mux-asset/abc")
        .json(&json!({ "title": "x" }))
        .await;
    assert_eq!(bad_update.status_code(), StatusCode::BAD_REQUEST);
    assert!(bad_update.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_delete_mux_asset_rejects_identifiers_of_another_record() {
    let (server, _temp, mux) = setup_test_server();
    let first = create_asset(&server, json!({ "title": "a", "asset_id": "asset-A" })).await;
    let second = create_asset(&server, json!({ "title": "b", "asset_id": "asset-B" })).await;
    let first_id = first["id"].as_u64().expect("id");
    let second_id = second["id"].as_u64().expect("id");

    let form = MultipartForm::new()
        .add_text("id", first_id.to_string())
        .add_text("asset_id", "asset-B")
        .add_text("upload_id", "")
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(mux.calls().is_empty());

    for id in [first_id, second_id] {
        let kept = server
            .get(&format!("/mux-video-uploader/mux-asset/{}", id))
            .await;
        assert_eq!(kept.status_code(), StatusCode::OK);
    }

    let form = MultipartForm::new()
        .add_text("id", first_id.to_string())
        .add_text("delete_on_mux", "true");
    let response = server
        .post("/mux-video-uploader/deleteMuxAsset")
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        mux.calls(),
        vec![MuxCall::DeleteAsset {
            asset_id: "asset-A".to_string()
        }]
    );
}

#[tokio::test]
async fn test_bearer_token_gates_admin_routes_but_not_webhook() {
    let (server, _temp, _mux) = setup_test_server_with(|config| {
        let mut config = configured(config);
        config.api_token = Some("s3cret".to_string());
        config
    });

    let anonymous = server.get("/mux-video-uploader/mux-asset").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    let wrong = server
        .get("/mux-video-uploader/mux-asset")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);

    let authorized = server
        .get("/mux-video-uploader/mux-asset")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"))
        .await;
    assert_eq!(authorized.status_code(), StatusCode::OK);

    let webhook = server
        .post("/mux-video-uploader/webhook-handler")
        .json(&json!({ "type": "video.asset.created", "data": { "id": "a-1" } }))
        .await;
    assert_eq!(webhook.status_code(), StatusCode::OK);
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_secs()
}

#[tokio::test]
async fn test_signed_webhook_marks_asset_ready() {
    let (server, _temp, _mux) = setup_test_server_with(|config| {
        let mut config = configured(config);
        config.mux_webhook_signing_secret = Some("whsec".to_string());
        config
    });
    let created = create_asset(&server, json!({ "title": "clip", "upload_id": "up-1" })).await;
    let id = created["id"].as_u64().expect("id");

    let body = serde_json::to_vec(&json!({
        "type": "video.asset.ready",
        "data": {
            "id": "asset-1",
            "upload_id": "up-1",
            "status": "ready",
            "playback_ids": [{ "id": "play-1", "policy": "public" }],
            "duration": 4.2,
            "aspect_ratio": "16:9"
        }
    }))
    .expect("body");
    let now = unix_now();
    let signature = format!(
        "t={},v1={}",
        now,
        sign_payload("whsec", now, &body).expect("sign")
    );

    let response = server
        .post("/mux-video-uploader/webhook-handler")
        .add_header(
            HeaderName::from_static("mux-signature"),
            HeaderValue::from_str(&signature).expect("header"),
        )
        .content_type("application/json")
        .bytes(Bytes::from(body))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({ "received": true, "updated": id })
    );

    let record = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await
        .json::<Value>();
    assert_eq!(record["isReady"], json!(true));
    assert_eq!(record["asset_id"], "asset-1");
    assert_eq!(record["playback_id"], "play-1");
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_rejected() {
    let (server, _temp, _mux) = setup_test_server_with(|config| {
        let mut config = configured(config);
        config.mux_webhook_signing_secret = Some("whsec".to_string());
        config
    });
    let created = create_asset(&server, json!({ "title": "clip", "upload_id": "up-2" })).await;
    let id = created["id"].as_u64().expect("id");

    let body = br#"{"type":"video.upload.cancelled","data":{"id":"up-2"}}"#.to_vec();
    let now = unix_now();
    let forged = format!("t={},v1={}", now, "0".repeat(64));

    let response = server
        .post("/mux-video-uploader/webhook-handler")
        .add_header(
            HeaderName::from_static("mux-signature"),
            HeaderValue::from_str(&forged).expect("header"),
        )
        .content_type("application/json")
        .bytes(Bytes::from(body.clone()))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let unsigned = server
        .post("/mux-video-uploader/webhook-handler")
        .content_type("application/json")
        .bytes(Bytes::from(body))
        .await;
    assert_eq!(unsigned.status_code(), StatusCode::UNAUTHORIZED);

    let record = server
        .get(&format!("/mux-video-uploader/mux-asset/{}", id))
        .await
        .json::<Value>();
    assert_eq!(record["error_message"], Value::Null);
}

#[tokio::test]
async fn test_webhook_for_unknown_record_is_acknowledged() {
    let (server, _temp, _mux) = setup_test_server();
    let response = server
        .post("/mux-video-uploader/webhook-handler")
        .json(&json!({
            "type": "video.upload.asset_created",
            "data": { "id": "nobody", "asset_id": "asset-x" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>(),
        json!({ "received": true, "updated": null })
    );
}
