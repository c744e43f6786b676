// Copyright (c) 2026  Teddy Wing
//
// This file is part of Reposcope.
//
// Reposcope is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Reposcope is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Reposcope. If not, see <https://www.gnu.org/licenses/>.


//! Aggregates metadata about every repository of a GitHub organisation,
//! refreshes it periodically, and serves it over HTTP.

pub mod aggregate;
pub mod config;
pub mod cycle;
pub mod github;
pub mod lister;
pub mod progress;
pub mod record;
pub mod scheduler;
pub mod server;
pub mod snapshot;


use crate::config::Settings;
use crate::cycle::Aggregator;
use crate::server::AppState;
use crate::snapshot::Store;

use std::sync::Arc;


/// Start refreshing and serve until the HTTP server fails.
///
/// The first cycle starts immediately; the listener does not wait for it.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    if settings.token.is_none() {
        log::warn!(
            "no token configured, requests to the GitHub API are unauthenticated",
        );
    }

    let client = github::Client::new(
        &settings.api_url,
        settings.token.as_deref(),
        settings.request_timeout(),
    )?;

    let store = Store::new();
    let period = settings.refresh_period();
    let port = settings.port;

    let aggregator = Aggregator::new(
        client.clone(),
        Arc::new(settings),
        store.clone(),
    );

    let refresh = tokio::spawn(scheduler::run(aggregator, period));

    let result = server::serve(port, AppState { store, client }).await;

    refresh.abort();

    Ok(result?)
}
