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


use axum::extract::State;
use axum::http::header::{self, HeaderValue};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use tokio::net::TcpListener;

use crate::github;
use crate::record::Projects;
use crate::snapshot::Store;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;


#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub client: github::Client,
}


/// `GET /projects` serves the snapshot, `GET /api/*` proxies the upstream
/// API. Every response allows any origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/projects", get(projects))
        .route("/api/{*path}", get(passthrough))
        .layer(middleware::map_response(allow_any_origin))
        .with_state(state)
}

/// Listen on every interface until the server fails.
pub async fn serve(port: u16, state: AppState) -> std::io::Result<()> {
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(address).await?;

    log::info!("listening on port {}", port);

    axum::serve(listener, router(state)).await
}


async fn projects(State(state): State<AppState>) -> Json<Arc<Projects>> {
    Json(state.store.current())
}

/// Forward everything after `/api` to the upstream API. Upstream failures
/// are answered with an empty 200.
async fn passthrough(State(state): State<AppState>, uri: Uri) -> Response {
    let path = upstream_path(&uri);

    log::info!("{}", uri);

    match state.client.get(path).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            log::warn!("{}: {:#}", path, anyhow::Error::new(e));

            StatusCode::OK.into_response()
        },
    }
}

fn upstream_path(uri: &Uri) -> &str {
    let path_and_query = uri.path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());

    path_and_query.strip_prefix("/api")
        .unwrap_or(path_and_query)
}

async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );

    response
}
