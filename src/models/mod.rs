// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod read_models;
pub mod user;
pub mod video;

pub use read_models::{ChannelProfile, VideoOwner, WatchedVideo};
pub use user::{NewUser, User, UserProfile};
pub use video::{Subscription, Video};
