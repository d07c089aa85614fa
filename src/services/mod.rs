// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod media;
pub mod password;
pub mod profile;
pub mod read_models;
pub mod session;
pub mod tokens;
pub mod uploads;

pub use media::{MediaService, UploadedMedia};
pub use tokens::{TokenPair, TokenService};
