use serde_json::json;
use wiremock::matchers::any;
use wiremock::matchers::basic_auth;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::TestApp;
use crate::helpers::BLANK_POPUP;

async fn fields(
    app: &TestApp,
    popup: &str,
) -> serde_json::Value {
    let resp = app.get(&format!("/admin/popups/{popup}/fields")).await;
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn integration_is_registered() {
    let app = spawn_app().await;
    let body: serde_json::Value = app.get("/admin/integrations").await.json().await.unwrap();
    assert_eq!(body["mailchimp"], "Mailchimp");
}

#[tokio::test]
async fn unconfigured_popup_gets_the_bare_form() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.mailchimp_server)
        .await;

    let body = fields(&app, BLANK_POPUP).await;
    let fields = body["fields"].as_array().unwrap();
    let ids: Vec<&str> = fields.iter().map(|f| f["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        [
            "mailchimp-apikey",
            "mailchimp-serverprefix",
            "mailchimp-list",
            "mailchimp-double_opt_in",
            "mailchimp-email-label",
            "mailchimp-add-privacy-checkbox",
            "mailchimp-privacy-label",
            "mailchimp-privacy-description",
            "mailchimp-submit-label",
        ]
    );
    for field in fields {
        assert_eq!(
            field["deps"],
            json!({"ids": "_newsletter-integration", "values": "mailchimp"})
        );
    }
    assert_eq!(
        fields[2]["options"],
        json!([{"value": "-1", "label": "Select a list"}])
    );
    assert_eq!(fields[2]["type"], "select-mailchimp");
    assert!(body["refresh_token"].is_string());
    assert!(body["settings_token"].is_string());
}

#[tokio::test]
async fn form_tokens_work_for_their_own_action() {
    let app = spawn_app().await;
    let body = fields(&app, BLANK_POPUP).await;
    let refresh_token = body["refresh_token"].as_str().unwrap();
    let settings_token = body["settings_token"].as_str().unwrap();

    let resp = app
        .post_refresh(&[("post_id", BLANK_POPUP), ("token", refresh_token)])
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .post_settings(BLANK_POPUP, &[("token", refresh_token)])
        .await;
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .post_settings(BLANK_POPUP, &[("token", settings_token)])
        .await;
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn saving_settings_without_token_is_forbidden() {
    let app = spawn_app().await;
    let resp = app
        .post_settings(BLANK_POPUP, &[("mailchimp-list", "a1")])
        .await;
    assert_eq!(resp.status().as_u16(), 403);

    let resp = app
        .post_settings(BLANK_POPUP, &[("mailchimp-list", "a1"), ("token", "0123456789abcdef0123")])
        .await;
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn saved_settings_are_used_to_subscribe() {
    let app = spawn_app().await;
    let body = fields(&app, BLANK_POPUP).await;
    let token = body["settings_token"].as_str().unwrap();

    let resp = app
        .post_settings(
            BLANK_POPUP,
            &[
                ("token", token),
                ("mailchimp-apikey", "key-us3"),
                ("mailchimp-serverprefix", "US3"),
                ("mailchimp-list", "c3"),
                ("mailchimp-double_opt_in", "no"),
                ("not-a-field", "ignored"),
            ],
        )
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let saved: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        saved,
        json!([
            "mailchimp-apikey",
            "mailchimp-serverprefix",
            "mailchimp-list",
            "mailchimp-double_opt_in",
        ])
    );

    Mock::given(path("/lists/c3"))
        .and(method("PATCH"))
        .and(basic_auth("user", "key-us3"))
        .and(body_json(json!({"double_optin": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "c3"})))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;
    Mock::given(path("/lists/c3"))
        .and(method("POST"))
        .and(body_json(json!({
            "members": [{
                "email_address": "jane@foo.com",
                "email_type": "html",
                "status": "subscribed",
            }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errors": []})))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.subscribe(BLANK_POPUP, "jane@foo.com").await;
    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp.text().await.unwrap().contains("Email successfully registered"));
}

#[tokio::test]
async fn bad_popup_ids_are_rejected() {
    let app = spawn_app().await;
    let resp = app.get("/admin/popups/a%20b/fields").await;
    assert_eq!(resp.status().as_u16(), 400);
}
