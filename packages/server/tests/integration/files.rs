use chrono::Duration;

use crate::common::{
    CLIENT_ID, SECRET, TestApp, container_without_image, id_token, routes, signed_token,
};

#[tokio::test]
async fn empty_bucket_lists_nothing() {
    let app = TestApp::spawn().await;

    let res = app.get_with_token(routes::LIST_FILES, &id_token("ada")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["files"].as_array().unwrap().len(), 0);
    assert_eq!(res.body["total"], 0);
}

#[tokio::test]
async fn list_reports_every_key() {
    let app = TestApp::spawn().await;
    app.put_object("TEM_2.nxs", b"two".to_vec()).await;
    app.put_object("TEM_1.nxs", b"one".to_vec()).await;
    app.put_object("notes.txt", b"hello".to_vec()).await;

    let res = app.get_with_token(routes::LIST_FILES, &id_token("ada")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["total"], 3);
    let mut files: Vec<&str> = res.body["files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    files.sort();
    assert_eq!(files, ["TEM_1.nxs", "TEM_2.nxs", "notes.txt"]);
}

#[tokio::test]
async fn container_without_image_has_empty_preview() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");
    let scratch = tempfile::tempdir().unwrap();
    app.put_object("TEM_7.nxs", container_without_image(scratch.path()))
        .await;

    let res = app.get_with_token(&routes::view_file("TEM_7.nxs"), &token).await;
    assert_eq!(res.status, 200, "{}", res.text());
    assert_eq!(res.body["file_name"], "TEM_7.nxs");
    assert_eq!(res.body["image_data_list"].as_array().unwrap().len(), 0);

    let res = app
        .get_with_token(&routes::download_image("TEM_7.nxs"), &token)
        .await;
    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
}

#[tokio::test]
async fn raw_download_returns_stored_bytes() {
    let app = TestApp::spawn().await;
    app.put_object("notes.txt", b"abc".to_vec()).await;

    let res = app
        .get_with_token(&routes::download_file("notes.txt"), &id_token("ada"))
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.bytes, b"abc");
    assert!(res.header("content-type").starts_with("text/plain"));
    assert_eq!(res.header("content-length"), "3");
    assert_eq!(
        res.header("etag"),
        "\"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\""
    );
    assert!(res.header("content-disposition").starts_with("attachment;"));
}

#[tokio::test]
async fn non_container_preview_is_a_processing_error() {
    let app = TestApp::spawn().await;
    app.put_object("TEM_3.nxs", b"not hdf5".to_vec()).await;

    let res = app
        .get_with_token(&routes::view_file("TEM_3.nxs"), &id_token("ada"))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.code(), "PROCESSING_ERROR");
}

#[tokio::test]
async fn missing_object_is_a_store_error() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let res = app
        .get_with_token(&routes::download_file("TEM_0.nxs"), &token)
        .await;
    assert_eq!(res.status, 500);
    assert_eq!(res.code(), "STORE_ERROR");

    let res = app.get_with_token(&routes::view_file("TEM_0.nxs"), &token).await;
    assert_eq!(res.status, 500);
    assert_eq!(res.code(), "STORE_ERROR");
}

#[tokio::test]
async fn hidden_key_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .get_with_token(&routes::download_file(".hidden"), &id_token("ada"))
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn cookie_token_is_accepted() {
    let app = TestApp::spawn().await;

    let res = app
        .get_with_cookie(routes::LIST_FILES, &id_token("ada"))
        .await;

    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::LIST_FILES).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");
}

#[tokio::test]
async fn bad_tokens_are_rejected() {
    let app = TestApp::spawn().await;
    let tokens = [
        "not-a-jwt".to_string(),
        signed_token("ada", CLIENT_ID, "some-other-secret", Duration::hours(1)),
        signed_token("ada", "another-client", SECRET, Duration::hours(1)),
        signed_token("ada", CLIENT_ID, SECRET, Duration::hours(-2)),
    ];

    for token in tokens {
        let res = app.get_with_token(routes::LIST_FILES, &token).await;
        assert_eq!(res.status, 401, "token {token} was accepted");
        assert_eq!(res.code(), "TOKEN_INVALID");
    }
}
