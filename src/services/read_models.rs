// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read models for the profile endpoints.
//!
//! Each function assembles one fixed result shape from store lookups:
//! - `channel_profile`: user by username joined with subscription edges in
//!   both directions
//! - `watch_history`: the caller's watched video IDs joined with videos and
//!   each video's owner

use crate::db::Database;
use crate::error::AppError;
use crate::models::{ChannelProfile, User, VideoOwner, WatchedVideo};
use futures_util::{stream, StreamExt, TryStreamExt};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 16;

/// Build the public channel page for `username`.
///
/// `caller_id` is the resolved identity, if any; it only affects
/// `is_subscribed`.
pub async fn channel_profile(
    db: &Database,
    username: &str,
    caller_id: Option<&str>,
) -> Result<ChannelProfile, AppError> {
    let username = username.trim().to_lowercase();

    let channel = db
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))?;

    let (subscribers, subscribed_to) = tokio::try_join!(
        db.subscriptions_to_channel(&channel.id),
        db.subscriptions_by_subscriber(&channel.id),
    )?;

    let is_subscribed =
        caller_id.is_some_and(|caller| subscribers.iter().any(|s| s.subscriber == caller));

    tracing::debug!(
        channel_id = %channel.id,
        subscribers = subscribers.len(),
        subscribed_to = subscribed_to.len(),
        is_subscribed,
        "Channel profile assembled"
    );

    Ok(ChannelProfile {
        id: channel.id,
        full_name: channel.full_name,
        username: channel.username,
        subscribers_count: subscribers.len() as u64,
        channels_subscribed_to_count: subscribed_to.len() as u64,
        is_subscribed,
        avatar: channel.avatar,
        cover_image: channel.cover_image,
        email: channel.email,
    })
}

/// Resolve `user`'s watch history in stored order.
///
/// IDs with no matching video are skipped. Owners are looked up once per
/// distinct owner and embedded as a single object.
pub async fn watch_history(db: &Database, user: &User) -> Result<Vec<WatchedVideo>, AppError> {
    let videos: Vec<_> = stream::iter(user.watch_history.clone())
        .map(|video_id| async move { db.get_video(&video_id).await })
        .buffered(MAX_CONCURRENT_DB_OPS)
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .flatten()
        .collect();

    let mut owner_ids: Vec<String> = videos.iter().map(|v| v.owner.clone()).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners: HashMap<String, VideoOwner> = stream::iter(owner_ids)
        .map(|owner_id| async move { db.get_user(&owner_id).await })
        .buffer_unordered(MAX_CONCURRENT_DB_OPS)
        .try_collect::<Vec<_>>()
        .await?
        .into_iter()
        .flatten()
        .map(|owner| (owner.id.clone(), VideoOwner::from(&owner)))
        .collect();

    Ok(videos
        .into_iter()
        .map(|video| {
            let owner = owners.get(&video.owner).cloned();
            WatchedVideo::new(video, owner)
        })
        .collect())
}
