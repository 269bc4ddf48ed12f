use std::path::PathBuf;
use std::sync::Arc;

use nexus::{BuildRequest, ContainerBuilder, ConversionError};
use serde_json::json;

use crate::common::{TestApp, experiment_form, id_token, routes, tiff_part};

struct FailingBuilder;

impl ContainerBuilder for FailingBuilder {
    fn build(&self, request: &BuildRequest) -> Result<PathBuf, ConversionError> {
        std::fs::write(&request.output, b"partial")?;
        Err(ConversionError::UnsupportedImage("three channels".into()))
    }
}

fn is_container_key(key: &str) -> bool {
    key.strip_prefix("TEM_")
        .and_then(|rest| rest.strip_suffix(".nxs"))
        .is_some_and(|secs| !secs.is_empty() && secs.bytes().all(|b| b.is_ascii_digit()))
}

#[tokio::test]
async fn form_lists_schemas_and_options() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let res = app.get_with_token(routes::NEW_EXPERIMENT, &token).await;

    assert_eq!(res.status, 200, "{}", res.text());
    let schemas: Vec<&str> = res.body["schema_files"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(
        schemas,
        ["ED_mapping.json", "TEM_mapping.json", "TVIPS_mapping.json"]
    );
    assert_eq!(res.body["experiment_types"], json!(["ED", "TVIPS", "TEM"]));
    assert_eq!(res.body["materials"].as_array().unwrap().len(), 4);
    assert_eq!(res.body["materials"][3], "Other");
    assert_eq!(res.body["default_location"], "Trieste");
    assert!(res.body["current_year"].as_i64().unwrap() >= 2024);
}

#[tokio::test]
async fn upload_then_browse_and_download() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let key = app.create_experiment(&token).await;
    assert!(is_container_key(&key), "unexpected key {key}");
    assert!(app.staging_is_empty());

    let res = app.get_with_token(routes::LIST_FILES, &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["files"], json!([key]));
    assert_eq!(res.body["total"], 1);

    let res = app.get_with_token(&routes::view_file(&key), &token).await;
    assert_eq!(res.status, 200, "{}", res.text());
    assert_eq!(res.body["file_name"], key.as_str());
    let images = res.body["image_data_list"].as_array().unwrap();
    assert_eq!(images.len(), 1);
    assert!(!images[0].as_str().unwrap().is_empty());

    let res = app.get_with_token(&routes::download_image(&key), &token).await;
    assert_eq!(res.status, 200, "{}", res.text());
    assert_eq!(res.header("content-type"), "image/png");
    assert!(res.bytes.starts_with(b"\x89PNG"));
    assert!(res.header("content-disposition").contains("extracted_image.png"));
    assert!(res.header("etag").starts_with('"'));

    let res = app.get_with_token(&routes::download_file(&key), &token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.header("content-type"), "application/x-hdf5");
    assert!(res.bytes.starts_with(b"\x89HDF"));
    assert!(res.header("content-disposition").contains(&key));
}

#[tokio::test]
async fn upload_without_images_is_rejected() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, experiment_form("TVIPS", ""), &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let list = app.get_with_token(routes::LIST_FILES, &token).await;
    assert_eq!(list.body["total"], 0);
}

#[tokio::test]
async fn empty_file_part_is_ignored() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");
    let empty = reqwest::multipart::Part::bytes(Vec::new()).file_name("");
    let form = experiment_form("ED", "").part("image_files", empty);

    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn other_type_needs_a_valid_schema_file() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let form = experiment_form("TEM", "../secrets.json").part("image_files", tiff_part("a.tif"));
    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");

    let form = experiment_form("TEM", "TEM_mapping.json").part("image_files", tiff_part("a.tif"));
    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;
    assert_eq!(res.status, 201, "{}", res.text());
    assert_eq!(res.body["status"], "success");
}

#[tokio::test]
async fn unknown_schema_file_is_a_conversion_error() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let form = experiment_form("TEM", "missing.json").part("image_files", tiff_part("a.tif"));
    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.code(), "CONVERSION_ERROR");
    assert!(app.staging_is_empty());
}

#[tokio::test]
async fn upload_requires_authentication() {
    let app = TestApp::spawn().await;
    let form = experiment_form("TVIPS", "").part("image_files", tiff_part("a.tif"));

    let res = app
        .post_form_without_token(routes::NEW_EXPERIMENT, form)
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");
}

#[tokio::test]
async fn json_body_is_rejected() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let res = app
        .post_json_with_token(
            routes::NEW_EXPERIMENT,
            &json!({"experiment_type": "ED"}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn nul_in_text_field_is_rejected() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");
    let form = experiment_form("ED", "")
        .text("description", "line\0break")
        .part("image_files", tiff_part("a.tif"));

    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.code(), "VALIDATION_ERROR");
    assert!(res.body["message"].as_str().unwrap().contains("description"));
    assert!(app.staging_is_empty());
}

#[tokio::test]
async fn conversion_failure_stores_nothing() {
    let app = TestApp::spawn_with_builder(Arc::new(FailingBuilder)).await;
    let token = id_token("ada");
    let form = experiment_form("ED", "").part("image_files", tiff_part("a.tif"));

    let res = app
        .post_form_with_token(routes::NEW_EXPERIMENT, form, &token)
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.code(), "CONVERSION_ERROR");
    assert!(res.body["message"].as_str().unwrap().contains("three channels"));
    assert!(app.staging_is_empty());

    let list = app.get_with_token(routes::LIST_FILES, &token).await;
    assert_eq!(list.body["total"], 0);
}
