use crate::e2e::helpers;

use helpers::{unique_device_id, TestContext};
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_record_a_generated_reply(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("history@example.com").await.unwrap();
    let token = ctx.token_for(user.id);

    let reply = ctx
        .client
        .post_with_auth(
            "/api/replies",
            &json!({"text": "what are you up to", "style": "savage", "ad_watched": true}),
            &token,
        )
        .await
        .unwrap();
    reply.assert_status(StatusCode::OK);

    let response = ctx.client.get_with_auth("/api/history", &token).await.unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["page"], 0);
    assert_eq!(body["page_size"], 20);
    assert_eq!(body["has_more"], false);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], reply.json()["history_id"]);
    assert_eq!(entries[0]["response"], "savage reply to: what are you up to");
    assert_eq!(entries[0]["original_text"], "what are you up to");
    assert_eq!(entries[0]["response_type"], "savage");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_paginate_history_newest_first(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("pages@example.com").await.unwrap();
    ctx.fixtures.create_history_entries(user.id, 25).await.unwrap();
    let token = ctx.token_for(user.id);

    let first = ctx
        .client
        .get_with_auth("/api/history?page=0&page_size=10", &token)
        .await
        .unwrap();
    first.assert_status(StatusCode::OK);
    let body = first.json();
    assert_eq!(body["entries"].as_array().unwrap().len(), 10);
    assert_eq!(body["entries"][0]["response"], "reply 24");
    assert_eq!(body["entries"][9]["response"], "reply 15");
    assert_eq!(body["has_more"], true);

    let last = ctx
        .client
        .get_with_auth("/api/history?page=2&page_size=10", &token)
        .await
        .unwrap();
    let body = last.json();
    assert_eq!(body["entries"].as_array().unwrap().len(), 5);
    assert_eq!(body["entries"][4]["response"], "reply 0");
    assert_eq!(body["has_more"], false);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_an_empty_page_size(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("zero@example.com").await.unwrap();

    let response = ctx
        .client
        .get_with_auth("/api/history?page_size=0", &ctx.token_for(user.id))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("invalid_input");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_delete_an_own_entry(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("owner@example.com").await.unwrap();
    let ids = ctx.fixtures.create_history_entries(user.id, 3).await.unwrap();

    let response = ctx
        .client
        .delete_with_auth(&format!("/api/history/{}", ids[1]), &ctx.token_for(user.id))
        .await
        .unwrap();

    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(ctx.fixtures.get_history_count(user.id).await.unwrap(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_delete_another_users_entry(ctx: &TestContext) {
    let owner = ctx.fixtures.create_user("owner@example.com").await.unwrap();
    let intruder = ctx.fixtures.create_user("intruder@example.com").await.unwrap();
    let ids = ctx.fixtures.create_history_entries(owner.id, 1).await.unwrap();

    let response = ctx
        .client
        .delete_with_auth(&format!("/api/history/{}", ids[0]), &ctx.token_for(intruder.id))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_code("not_found");
    assert_eq!(ctx.fixtures.get_history_count(owner.id).await.unwrap(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_guest_history_on_the_device(ctx: &TestContext) {
    let device = unique_device_id();
    for text in ["first", "second"] {
        ctx.client
            .post_as_guest(
                "/api/replies",
                &json!({"text": text, "style": "flirty", "ad_watched": true}),
                &device,
            )
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    let response = ctx.client.get_as_guest("/api/history", &device).await.unwrap();
    let body = response.json();
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["original_text"], "second");
    assert_eq!(entries[1]["original_text"], "first");

    let other_device = ctx
        .client
        .get_as_guest("/api/history", &unique_device_id())
        .await
        .unwrap();
    assert_eq!(other_device.json()["entries"], json!([]));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_delete_a_guest_entry(ctx: &TestContext) {
    let device = unique_device_id();
    let reply = ctx
        .client
        .post_as_guest(
            "/api/replies",
            &json!({"text": "hey", "style": "witty", "ad_watched": true}),
            &device,
        )
        .await
        .unwrap();
    let entry_id = reply.json()["history_id"].as_str().unwrap().to_string();

    ctx.client
        .delete_as_guest(&format!("/api/history/{}", entry_id), &device)
        .await
        .unwrap()
        .assert_status(StatusCode::NO_CONTENT);

    let again = ctx
        .client
        .delete_as_guest(&format!("/api/history/{}", entry_id), &device)
        .await
        .unwrap();
    again.assert_status(StatusCode::NOT_FOUND);

    let response = ctx.client.get_as_guest("/api/history", &device).await.unwrap();
    assert_eq!(response.json()["entries"], json!([]));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_guest_and_account_history_apart(ctx: &TestContext) {
    let user = ctx.fixtures.create_user("apart@example.com").await.unwrap();
    ctx.fixtures.create_history_entries(user.id, 2).await.unwrap();
    let device = unique_device_id();

    let guest_view = ctx.client.get_as_guest("/api/history", &device).await.unwrap();
    assert_eq!(guest_view.json()["entries"], json!([]));

    let account_view = ctx
        .client
        .get_with_auth("/api/history", &ctx.token_for(user.id))
        .await
        .unwrap();
    assert_eq!(account_view.json()["entries"].as_array().unwrap().len(), 2);
}
