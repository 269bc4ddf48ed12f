use crate::common::{LOGOUT_ENDPOINT, TestApp, id_token, routes};

#[tokio::test]
async fn health_needs_no_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn home_shows_user_and_links() {
    let app = TestApp::spawn().await;

    let res = app.get_with_token(routes::HOME, &id_token("ada")).await;

    assert_eq!(res.status, 200, "{}", res.text());
    assert_eq!(res.body["user"]["subject"], "ada");
    assert_eq!(res.body["user"]["display_name"], "Test Operator");
    assert_eq!(res.body["user"]["email"], "ada@example.org");
    assert_eq!(res.body["links"]["new_experiment"], routes::NEW_EXPERIMENT);
    assert_eq!(res.body["links"]["list_files"], routes::LIST_FILES);
    assert_eq!(res.body["links"]["logout"], routes::LOGOUT);
}

#[tokio::test]
async fn home_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HOME).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.code(), "TOKEN_MISSING");
}

#[tokio::test]
async fn logout_redirects_with_token_hint() {
    let app = TestApp::spawn().await;
    let token = id_token("ada");

    let res = app.get_with_cookie(routes::LOGOUT, &token).await;

    assert_eq!(res.status, 303);
    assert_eq!(
        res.header("location"),
        format!(
            "{LOGOUT_ENDPOINT}?id_token_hint={token}\
             &post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A8000%2F"
        )
    );
    let cleared = res
        .headers
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("id_token=") && v.contains("Max-Age=0"));
    assert!(cleared, "id_token cookie was not cleared");
}

#[tokio::test]
async fn logout_without_session_still_redirects() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::LOGOUT).await;

    assert_eq!(res.status, 303);
    assert_eq!(
        res.header("location"),
        format!("{LOGOUT_ENDPOINT}?post_logout_redirect_uri=http%3A%2F%2Flocalhost%3A8000%2F")
    );
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    let paths = res.body["paths"].as_object().unwrap();
    for path in [
        "/",
        "/health",
        "/logout",
        "/files/new-experiment",
        "/files/list-files",
        "/files/view-file/{key}",
        "/files/download-file/{key}",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(res.body["components"]["securitySchemes"]["oidc"].is_object());
}
