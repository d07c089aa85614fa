// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! StreamHub accounts: user accounts for a media-sharing application
//!
//! This crate provides the backend API for registration, sessions
//! (access/refresh tokens), profile management, channel pages and
//! watch history.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use config::Config;
use db::Database;
use services::{MediaService, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: TokenService,
    pub media: MediaService,
}

impl AppState {
    pub fn new(config: Config, db: Database, media: MediaService) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            config,
            db,
            tokens,
            media,
        }
    }
}
