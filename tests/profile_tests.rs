// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile update, channel page and watch history tests.

use axum::http::StatusCode;
use serde_json::json;
use streamhub_accounts::models::{Subscription, Video};
use tower::ServiceExt;

mod common;
use common::{
    body_json, create_test_app, get_request, json_request, multipart_request, signed_in_user,
    Part,
};

fn video(id: &str, owner: &str, title: &str) -> Video {
    Video {
        id: id.to_string(),
        owner: owner.to_string(),
        title: title.to_string(),
        description: String::new(),
        video_file: format!("https://media.example/{}.mp4", id),
        thumbnail: format!("https://media.example/{}.jpg", id),
        duration: 42.0,
        views: 0,
        is_published: true,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNT DETAILS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_update_account_details() {
    let (app, state) = create_test_app();
    let (user_id, access, _) = signed_in_user(&app, "quinn").await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/v1/users/update-account",
            json!({ "fullName": "Quinn Renamed", "email": "quinn2@example.com" }),
            Some(&access),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Account details updated successfully");
    assert_eq!(body["data"]["fullName"], "Quinn Renamed");
    assert!(body["data"].get("password").is_none());

    let stored = state.db.get_user(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.email, "quinn2@example.com");
    assert!(stored.has_active_session(), "session survives the update");
}

#[tokio::test]
async fn test_update_account_requires_both_fields() {
    let (app, _) = create_test_app();
    let (_, access, _) = signed_in_user(&app, "rupert").await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/v1/users/update-account",
            json!({ "fullName": "Only Name" }),
            Some(&access),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "All fields are required");
}

#[tokio::test]
async fn test_update_account_rejects_taken_email() {
    let (app, _) = create_test_app();
    signed_in_user(&app, "sybil").await;
    let (_, access, _) = signed_in_user(&app, "trent").await;

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/api/v1/users/update-account",
            json!({ "fullName": "Trent", "email": "sybil@example.com" }),
            Some(&access),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ═══════════════════════════════════════════════════════════════════════════
// IMAGES
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_update_avatar_replaces_url() {
    let (app, state) = create_test_app();
    let (user_id, access, _) = signed_in_user(&app, "uma").await;
    let before = state.db.get_user(&user_id).await.unwrap().unwrap().avatar;

    let mut request = multipart_request(
        "PATCH",
        "/api/v1/users/avatar",
        &[Part::File("avatar", "new.png", b"new avatar bytes")],
    );
    request.headers_mut().insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {}", access).parse().unwrap(),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Avatar image updated successfully");

    let after = body["data"]["avatar"].as_str().unwrap();
    assert_ne!(after, before);
    assert!(after.ends_with(".png"));
}

#[tokio::test]
async fn test_update_cover_image_missing_file() {
    let (app, _) = create_test_app();
    let (_, access, _) = signed_in_user(&app, "victor").await;

    let mut request = multipart_request(
        "PATCH",
        "/api/v1/users/cover-image",
        &[Part::Text("note", "no file here")],
    );
    request.headers_mut().insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {}", access).parse().unwrap(),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Cover image file is missing"
    );
}

#[tokio::test]
async fn test_update_cover_image_sets_url() {
    let (app, _) = create_test_app();
    let (_, access, _) = signed_in_user(&app, "walter").await;

    let mut request = multipart_request(
        "PATCH",
        "/api/v1/users/cover-image",
        &[Part::File("coverImage", "cover.jpg", b"cover bytes")],
    );
    request.headers_mut().insert(
        axum::http::header::AUTHORIZATION,
        format!("Bearer {}", access).parse().unwrap(),
    );

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["coverImage"]
        .as_str()
        .unwrap()
        .ends_with(".jpg"));
}

// ═══════════════════════════════════════════════════════════════════════════
// CHANNEL PROFILE
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_channel_profile_counts_and_subscription_flag() {
    let (app, state) = create_test_app();
    let (channel_id, _, _) = signed_in_user(&app, "xena").await;
    let (fan_id, fan_access, _) = signed_in_user(&app, "yuri").await;
    let (other_id, other_access, _) = signed_in_user(&app, "zack").await;

    state
        .db
        .record_subscription(&Subscription::new(&fan_id, &channel_id))
        .await
        .unwrap();
    state
        .db
        .record_subscription(&Subscription::new(&channel_id, &other_id))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/c/XENA", Some(&fan_access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let data = &body["data"];
    assert_eq!(data["username"], "xena");
    assert_eq!(data["subscribersCount"], 1);
    assert_eq!(data["channelsSubscribedToCount"], 1);
    assert_eq!(data["isSubscribed"], true);
    assert!(data.get("password").is_none());

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/c/xena", Some(&other_access)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["data"]["isSubscribed"], false);

    // Anonymous callers see the page too
    let response = app
        .oneshot(get_request("/api/v1/users/c/xena", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["isSubscribed"], false);
}

#[tokio::test]
async fn test_channel_profile_not_found() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(get_request("/api/v1/users/c/ghost", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Channel does not exist");
}

// ═══════════════════════════════════════════════════════════════════════════
// WATCH HISTORY
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_watch_history_order_and_owner() {
    let (app, state) = create_test_app();
    let (creator_id, _, _) = signed_in_user(&app, "creator").await;
    let (viewer_id, viewer_access, _) = signed_in_user(&app, "viewer").await;

    state
        .db
        .insert_video(&video("v1", &creator_id, "First"))
        .await
        .unwrap();
    state
        .db
        .insert_video(&video("v2", &creator_id, "Second"))
        .await
        .unwrap();

    for id in ["v2", "missing", "v1"] {
        state.db.push_watch_history(&viewer_id, id).await.unwrap();
    }

    let response = app
        .oneshot(get_request("/api/v1/users/history", Some(&viewer_access)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Watch history fetched successfully");
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2, "unknown video IDs are skipped");
    assert_eq!(entries[0]["title"], "Second");
    assert_eq!(entries[1]["title"], "First");

    let owner = &entries[0]["owner"];
    assert!(owner.is_object());
    assert_eq!(owner["username"], "creator");
    assert_eq!(owner["_id"], creator_id.as_str());
    assert!(owner.get("email").is_none());
}

#[tokio::test]
async fn test_watch_history_empty() {
    let (app, _) = create_test_app();
    let (_, access, _) = signed_in_user(&app, "newbie").await;

    let response = app
        .oneshot(get_request("/api/v1/users/history", Some(&access)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!([]));
}
