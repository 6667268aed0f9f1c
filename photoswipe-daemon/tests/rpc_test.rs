//! Integration tests for the daemon RPC API.
//!
//! These tests drive the JSON-RPC server over a Unix socket against a mock
//! photo library and verify sessions, actions, settings and bindings.

mod common;

use common::{can_bind_unix_socket, open_session, rpc_err, rpc_ok, setup_test_server};
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn mount_albums(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/albums"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "albums": [
                { "id": "holidays-1", "title": "Holidays" },
                { "id": "trash-1", "title": "PhotoSwipe Trash" }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_lifecycle() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_session_lifecycle: Unix sockets not permitted in sandbox");
        return;
    }

    let (_temp_dir, socket_path, handle) = setup_test_server(None).await;

    let session = open_session(&socket_path, "owner-1").await;

    let status = rpc_ok(&socket_path, "credential_status", json!({ "session": session })).await;
    assert_eq!(status["state"], "valid");
    assert!(status["expires_at"].is_string());

    let closed = rpc_ok(&socket_path, "close_session", json!({ "session": session })).await;
    assert_eq!(closed["success"], true);

    let error = rpc_err(&socket_path, "credential_status", json!({ "session": session })).await;
    assert_eq!(error["code"], -32001);
    assert_eq!(error["data"]["httpStatus"], 401);

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_open_session_rejects_empty_token() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_open_session_rejects_empty_token: Unix sockets not permitted in sandbox");
        return;
    }

    let (_temp_dir, socket_path, handle) = setup_test_server(None).await;

    let error = rpc_err(
        &socket_path,
        "open_session",
        json!({
            "owner": "owner-1",
            "credentials": {
                "access_token": "",
                "client_id": "id",
                "client_secret": "secret"
            }
        }),
    )
    .await;
    assert_eq!(error["code"], -32602);
    assert_eq!(error["data"]["httpStatus"], 400);

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_session_is_rejected_before_dispatch() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_unknown_session_is_rejected_before_dispatch: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;

    let error = rpc_err(
        &socket_path,
        "perform_action",
        json!({
            "session": "not-a-session",
            "request": { "action": "album", "mediaId": "m1", "albumId": "A1" }
        }),
    )
    .await;

    assert_eq!(error["code"], -32001);
    assert_eq!(error["data"]["httpStatus"], 401);
    assert!(error["data"]["error"]
        .as_str()
        .unwrap()
        .contains("no active session"));

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_trash_action_moves_into_trash_album() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_trash_action_moves_into_trash_album: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    mount_albums(&mock_server).await;
    Mock::given(method("POST"))
        .and(path("/v1/albums/trash-1:batchAddMediaItems"))
        .and(body_json(json!({ "mediaItemIds": ["m1"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;
    let session = open_session(&socket_path, "owner-1").await;

    let result = rpc_ok(
        &socket_path,
        "perform_action",
        json!({
            "session": session,
            "request": { "action": "trash", "mediaId": "m1" }
        }),
    )
    .await;
    assert_eq!(result, json!({ "success": true }));

    let error = rpc_err(
        &socket_path,
        "perform_action",
        json!({
            "session": session,
            "request": { "action": "album", "mediaId": "m1" }
        }),
    )
    .await;
    assert_eq!(error["code"], -32602);
    assert_eq!(error["data"]["httpStatus"], 400);

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_upstream_failure_carries_external_status() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_upstream_failure_carries_external_status: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/albums/A1:batchAddMediaItems"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Caller is not the album owner.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&mock_server)
        .await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;
    let session = open_session(&socket_path, "owner-1").await;

    let error = rpc_err(
        &socket_path,
        "perform_action",
        json!({
            "session": session,
            "request": { "action": "album", "mediaId": "m1", "albumId": "A1" }
        }),
    )
    .await;

    assert_eq!(error["code"], -32002);
    assert_eq!(error["data"]["httpStatus"], 403);
    assert!(error["data"]["error"]
        .as_str()
        .unwrap()
        .contains("Caller is not the album owner."));

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_media_passes_library_body_through() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_get_media_passes_library_body_through: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    let body = json!({
        "mediaItemResults": [
            { "mediaItem": { "id": "m1", "baseUrl": "https://lh3.example/m1" } }
        ]
    });
    Mock::given(method("GET"))
        .and(path("/v1/mediaItems:batchGet"))
        .and(query_param("mediaItemIds", "m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .mount(&mock_server)
        .await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;
    let session = open_session(&socket_path, "owner-1").await;

    let result = rpc_ok(
        &socket_path,
        "get_media",
        json!({ "session": session, "media_ids": ["m1"] }),
    )
    .await;
    assert_eq!(result, body);

    let error = rpc_err(
        &socket_path,
        "get_media",
        json!({ "session": session, "media_ids": [] }),
    )
    .await;
    assert_eq!(error["data"]["httpStatus"], 400);

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bindings_round_trip_through_settings() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_bindings_round_trip_through_settings: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    mount_albums(&mock_server).await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;
    let session = open_session(&socket_path, "owner-1").await;
    let other = open_session(&socket_path, "owner-2").await;

    // Empty at first, albums listed
    let settings = rpc_ok(&socket_path, "get_settings", json!({ "session": session })).await;
    assert_eq!(settings["bindings"], json!([]));
    assert_eq!(settings["albums"].as_array().unwrap().len(), 2);

    let saved = rpc_ok(
        &socket_path,
        "save_binding",
        json!({
            "session": session,
            "binding": { "key": "1", "action": "album", "album_id": "holidays-1", "album_name": "Holidays" }
        }),
    )
    .await;
    assert_eq!(saved["success"], true);
    let binding_id = saved["id"].as_str().unwrap().to_string();

    rpc_ok(
        &socket_path,
        "save_binding",
        json!({ "session": session, "binding": { "key": "Delete", "action": "trash" } }),
    )
    .await;

    let settings = rpc_ok(&socket_path, "get_settings", json!({ "session": session })).await;
    let bindings = settings["bindings"].as_array().unwrap();
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0]["id"], binding_id.as_str());
    assert_eq!(bindings[0]["album_name"], "Holidays");
    assert_eq!(bindings[1]["action"], "trash");

    // Another owner can neither see nor delete them
    let settings = rpc_ok(&socket_path, "get_settings", json!({ "session": other })).await;
    assert_eq!(settings["bindings"], json!([]));
    let error = rpc_err(
        &socket_path,
        "delete_binding",
        json!({ "session": other, "id": binding_id }),
    )
    .await;
    assert_eq!(error["code"], -32004);
    assert_eq!(error["data"]["httpStatus"], 404);

    let deleted = rpc_ok(
        &socket_path,
        "delete_binding",
        json!({ "session": session, "id": binding_id }),
    )
    .await;
    assert_eq!(deleted["success"], true);

    let settings = rpc_ok(&socket_path, "get_settings", json!({ "session": session })).await;
    assert_eq!(settings["bindings"].as_array().unwrap().len(), 1);

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_save_binding_validation() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_save_binding_validation: Unix sockets not permitted in sandbox");
        return;
    }

    let (_temp_dir, socket_path, handle) = setup_test_server(None).await;
    let session = open_session(&socket_path, "owner-1").await;

    for binding in [
        json!({ "key": "a", "action": "album" }),
        json!({ "key": "a", "action": "archive" }),
        json!({ "key": "this-key-name-is-far-too-long", "action": "trash" }),
    ] {
        let error = rpc_err(
            &socket_path,
            "save_binding",
            json!({ "session": session, "binding": binding }),
        )
        .await;
        assert_eq!(error["data"]["httpStatus"], 400, "binding {} accepted", binding);
    }

    handle.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_settings_albums_empty_when_listing_fails() {
    if !can_bind_unix_socket() {
        eprintln!("Skipping test_settings_albums_empty_when_listing_fails: Unix sockets not permitted in sandbox");
        return;
    }

    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/albums"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let (_temp_dir, socket_path, handle) = setup_test_server(Some(&mock_server)).await;
    let session = open_session(&socket_path, "owner-1").await;

    let settings = rpc_ok(&socket_path, "get_settings", json!({ "session": session })).await;
    assert_eq!(settings["albums"], json!([]));
    assert_eq!(settings["bindings"], json!([]));

    handle.stop().await.unwrap();
}
