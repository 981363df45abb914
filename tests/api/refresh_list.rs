use popup_mailchimp::form_token::TokenAction;
use serde_json::json;
use wiremock::matchers::any;
use wiremock::matchers::basic_auth;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::TestApp;
use crate::helpers::BLANK_POPUP;
use crate::helpers::READY_POPUP;

fn lists_body() -> serde_json::Value {
    json!({
        "lists": [
            {"id": "b2", "name": "Newsletter"},
            {"id": "a1", "name": "Customers"},
        ],
    })
}

async fn mount_lists(
    app: &TestApp,
    api_key: &str,
    times: u64,
) {
    Mock::given(path("/lists"))
        .and(method("GET"))
        .and(basic_auth("user", api_key))
        .and(query_param("fields", "lists.id,lists.name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lists_body()))
        .named("Get all lists")
        .expect(times)
        .mount(&app.mailchimp_server)
        .await;
}

#[tokio::test]
async fn refresh_returns_the_catalog() {
    let app = spawn_app().await;
    // a refresh always goes to Mailchimp, cached or not
    mount_lists(&app, "key-us21", 2).await;

    for _ in 0..2 {
        let resp = app.refresh(READY_POPUP).await;
        assert_eq!(resp.status().as_u16(), 200);
        // raw text, since `serde_json::Value` would sort the keys
        assert_eq!(
            resp.text().await.unwrap(),
            r#"{"b2":"Newsletter","a1":"Customers"}"#
        );
    }
}

#[tokio::test]
async fn refresh_without_credential() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.refresh(BLANK_POPUP).await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "false");
}

#[tokio::test]
async fn typed_credential_wins_over_saved_one() {
    let app = spawn_app().await;
    mount_lists(&app, "key-us9", 1).await;

    let token = app.token(TokenAction::RefreshList, BLANK_POPUP);
    let resp = app
        .post_refresh(&[
            ("post_id", BLANK_POPUP),
            ("token", token.as_str()),
            ("apikey", "key-us9"),
            ("serverprefix", "us9"),
        ])
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["b2"], "Newsletter");
}

#[tokio::test]
async fn cleared_api_key_means_no_catalog() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    // the popup has a saved key, but the form field was emptied
    let token = app.token(TokenAction::RefreshList, READY_POPUP);
    let resp = app
        .post_refresh(&[
            ("post_id", READY_POPUP),
            ("token", token.as_str()),
            ("apikey", ""),
        ])
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.unwrap(), "false");
}

#[tokio::test]
async fn refresh_needs_a_valid_token() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let subscribe_token = app.token(TokenAction::Subscribe, READY_POPUP);
    let other_popup = app.token(TokenAction::RefreshList, BLANK_POPUP);
    for (body, msg) in [
        (vec![("post_id", READY_POPUP)], "no token"),
        (
            vec![("post_id", READY_POPUP), ("token", subscribe_token.as_str())],
            "token for another action",
        ),
        (
            vec![("post_id", READY_POPUP), ("token", other_popup.as_str())],
            "token for another popup",
        ),
        (vec![("post_id", "4 2"), ("token", "x")], "bad popup id"),
    ] {
        let resp = app.post_refresh(&body).await;
        assert_eq!(resp.status().as_u16(), 403, "{msg}");
        assert_eq!(resp.text().await.unwrap(), "false", "{msg}");
    }
}

#[tokio::test]
async fn provider_errors_are_reported() {
    let app = spawn_app().await;
    Mock::given(path("/lists"))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "https://mailchimp.com/developer/marketing/docs/errors/",
            "title": "API Key Invalid",
            "status": 401,
            "detail": "Your API key may be invalid, or you've attempted to access the wrong datacenter.",
        })))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.refresh(READY_POPUP).await;
    assert_eq!(resp.status().as_u16(), 502);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn refreshed_catalog_feeds_the_settings_form() {
    let app = spawn_app().await;
    // once for the refresh; the form reads the cache afterwards
    mount_lists(&app, "key-us21", 1).await;

    let resp = app.refresh(READY_POPUP).await;
    assert_eq!(resp.status().as_u16(), 200);

    for _ in 0..2 {
        let body: serde_json::Value = app
            .get(&format!("/admin/popups/{READY_POPUP}/fields"))
            .await
            .json()
            .await
            .unwrap();
        let list = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["id"] == "mailchimp-list")
            .unwrap();
        assert_eq!(
            list["options"],
            json!([
                {"value": "-1", "label": "Select a list"},
                {"value": "b2", "label": "Newsletter"},
                {"value": "a1", "label": "Customers"},
            ])
        );
    }
}
