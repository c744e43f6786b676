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


use reqwest::ClientBuilder;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use thiserror;

use std::time::Duration;


const USER_AGENT: &'static str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
);


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request error")]
    Http(#[from] reqwest::Error),

    #[error("request header error")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}


/// Entry of an organisation's repository listing.
#[derive(Debug, Deserialize)]
pub struct Repo {
    pub name: String,
}


/// GitHub API client shared by the aggregator and the HTTP front end.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            "application/vnd.github.v3+json".parse()?,
        );

        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("token {}", token))?;
            value.set_sensitive(true);

            headers.insert(header::AUTHORIZATION, value);
        }

        let http = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(
            Client {
                http,
                base_url: base_url.trim_end_matches('/').to_owned(),
            }
        )
    }

    /// GET an API resource by path, e.g. `/repos/w3c/csswg/issues`.
    ///
    /// The path, including any query string, is appended to the base URL
    /// as is. Non-success statuses are returned as errors.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, Error> {
        let url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };

        log::debug!("GET {}", url);

        let body = self.http.get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        Ok(body)
    }

    /// Fetch one page of an organisation's repositories.
    pub async fn org_repos(
        &self,
        organisation: &str,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<Repo>, Error> {
        let repo_page = self.http.get(
            format!(
                "{}/orgs/{}/repos?page={}&per_page={}",
                self.base_url,
                organisation,
                page,
                per_page,
            ),
        )
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Repo>>()
            .await?;

        Ok(repo_page)
    }
}
