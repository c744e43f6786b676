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


use chrono::{DateTime, Utc};
use futures::future;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror;
use tokio::sync::Semaphore;

use crate::cycle::Cycle;
use crate::github;
use crate::record::Update;

use std::fmt;


#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request failed")]
    Upstream(#[from] github::Error),

    #[error("unexpected response")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    Shape(&'static str),

    #[error("request limiter closed")]
    Closed,
}


/// The independent requests issued for every repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubFetch {
    Metadata,
    Commits,
    Issues,
    Contributors,
    PullRequests,
    Releases,
}

impl SubFetch {
    pub const ALL: [SubFetch; 6] = [
        SubFetch::Metadata,
        SubFetch::Commits,
        SubFetch::Issues,
        SubFetch::Contributors,
        SubFetch::PullRequests,
        SubFetch::Releases,
    ];

    pub fn path(self, organisation: &str, repo_name: &str) -> String {
        let base = format!("/repos/{}/{}", organisation, repo_name);

        match self {
            SubFetch::Metadata => base,
            SubFetch::Commits => base + "/commits",
            SubFetch::Issues => base + "/issues",
            SubFetch::Contributors => base + "/contributors",
            SubFetch::PullRequests => base + "/pulls",
            SubFetch::Releases => base + "/releases",
        }
    }

    /// Read this sub-fetch's fields out of a response body.
    pub fn extract(self, body: Value) -> Result<Update, FetchError> {
        match self {
            SubFetch::Metadata => {
                let fields = body.as_object()
                    .ok_or(FetchError::Shape("expected an object"))?;

                Ok(Update::Metadata {
                    created_on: field(fields, "created_at"),
                    description: field(fields, "description"),
                    website_url: field(fields, "homepage"),
                })
            },
            SubFetch::Commits => {
                let entry: CommitEntry = serde_json::from_value(first(body)?)?;

                Ok(Update::LastCommit(entry.commit.author.date))
            },
            SubFetch::Issues => Ok(Update::OpenedIssues(count(&body)?)),
            SubFetch::Contributors => Ok(Update::Contributors(count(&body)?)),
            SubFetch::PullRequests => {
                Ok(Update::PendingPullRequests(count(&body)?))
            },
            SubFetch::Releases => {
                let release: Release = serde_json::from_value(first(body)?)?;

                Ok(Update::LastRelease(release.tag_name))
            },
        }
    }

    /// Update to apply when the sub-fetch fails for any reason.
    ///
    /// Only releases have one: `last_release` becomes the empty string,
    /// where every other field stays as it was.
    pub fn fallback(self) -> Option<Update> {
        match self {
            SubFetch::Releases => Some(Update::LastRelease(String::new())),
            _ => None,
        }
    }
}

impl fmt::Display for SubFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SubFetch::Metadata => "metadata",
            SubFetch::Commits => "commits",
            SubFetch::Issues => "issues",
            SubFetch::Contributors => "contributors",
            SubFetch::PullRequests => "pull requests",
            SubFetch::Releases => "releases",
        };

        f.write_str(name)
    }
}


#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: Commit,
}

#[derive(Debug, Deserialize)]
struct Commit {
    author: Signature,
}

#[derive(Debug, Deserialize)]
struct Signature {
    date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
}


/// Read one field of an object. A missing, null or malformed value is
/// absent without affecting the object's other fields.
fn field<T: DeserializeOwned>(fields: &Map<String, Value>, key: &str) -> Option<T> {
    let value = fields.get(key)?;

    match Option::<T>::deserialize(value) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("ignoring malformed `{}`: {}", key, e);

            None
        },
    }
}

fn count(body: &Value) -> Result<usize, FetchError> {
    body.as_array()
        .map(Vec::len)
        .ok_or(FetchError::Shape("expected a list"))
}

fn first(body: Value) -> Result<Value, FetchError> {
    match body {
        Value::Array(entries) => entries.into_iter()
            .next()
            .ok_or(FetchError::Shape("empty list")),
        _ => Err(FetchError::Shape("expected a list")),
    }
}


/// Request one sub-fetch of a repository, holding a permit while the
/// request is in flight.
pub async fn fetch(
    client: &github::Client,
    permits: &Semaphore,
    organisation: &str,
    repo_name: &str,
    sub_fetch: SubFetch,
) -> Result<Update, FetchError> {
    let body = {
        let _permit = permits.acquire()
            .await
            .map_err(|_| FetchError::Closed)?;

        client.get(&sub_fetch.path(organisation, repo_name)).await?
    };

    sub_fetch.extract(body)
}

/// Run all six sub-fetches of a repository concurrently, applying each
/// result to the cycle's record as soon as it arrives.
///
/// Failures are logged and never affect sibling sub-fetches. Returns once
/// every sub-fetch has resolved.
pub async fn aggregate(
    client: &github::Client,
    permits: &Semaphore,
    organisation: &str,
    repo_name: &str,
    cycle: &Cycle,
) {
    let fetches = SubFetch::ALL.iter().map(|&sub_fetch| async move {
        match fetch(client, permits, organisation, repo_name, sub_fetch).await {
            Ok(update) => cycle.apply(repo_name, update),
            Err(e) => {
                log::warn!(
                    "{}: {} failed: {:#}",
                    repo_name,
                    sub_fetch,
                    anyhow::Error::new(e),
                );

                if let Some(update) = sub_fetch.fallback() {
                    cycle.apply(repo_name, update);
                }
            },
        }
    });

    future::join_all(fetches).await;
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn paths_hang_off_repository() {
        let paths: Vec<_> = SubFetch::ALL.iter()
            .map(|s| s.path("w3c", "csswg"))
            .collect();

        assert_eq!(
            paths,
            [
                "/repos/w3c/csswg",
                "/repos/w3c/csswg/commits",
                "/repos/w3c/csswg/issues",
                "/repos/w3c/csswg/contributors",
                "/repos/w3c/csswg/pulls",
                "/repos/w3c/csswg/releases",
            ],
        );
    }

    #[test]
    fn metadata_reads_three_fields() {
        let update = SubFetch::Metadata.extract(json!({
            "name": "csswg",
            "created_at": "2015-03-04T10:00:00Z",
            "description": "CSS drafts",
            "homepage": "https://drafts.csswg.org",
        })).unwrap();

        assert_eq!(
            update,
            Update::Metadata {
                created_on: Some(Utc.with_ymd_and_hms(2015, 3, 4, 10, 0, 0).unwrap()),
                description: Some("CSS drafts".to_owned()),
                website_url: Some("https://drafts.csswg.org".to_owned()),
            },
        );
    }

    #[test]
    fn metadata_rejects_non_object() {
        let result = SubFetch::Metadata.extract(json!([]));

        assert!(matches!(result, Err(FetchError::Shape("expected an object"))));
    }

    #[test]
    fn malformed_metadata_field_only_clears_itself() {
        let update = SubFetch::Metadata.extract(json!({
            "created_at": "2015-03-04",
            "description": "kept",
            "homepage": null,
        })).unwrap();

        assert_eq!(
            update,
            Update::Metadata {
                created_on: None,
                description: Some("kept".to_owned()),
                website_url: None,
            },
        );
    }

    #[test]
    fn missing_metadata_fields_are_absent() {
        let update = SubFetch::Metadata.extract(json!({
            "homepage": "https://example.com",
            "description": 42,
        })).unwrap();

        assert_eq!(
            update,
            Update::Metadata {
                created_on: None,
                description: None,
                website_url: Some("https://example.com".to_owned()),
            },
        );
    }

    #[test]
    fn commits_use_first_author_date() {
        let update = SubFetch::Commits.extract(json!([
            { "commit": { "author": { "date": "2021-06-01T12:00:00Z" } } },
            { "commit": { "author": { "date": "2020-01-01T00:00:00Z" } } },
        ])).unwrap();

        assert_eq!(
            update,
            Update::LastCommit(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()),
        );
    }

    #[test]
    fn empty_commits_have_no_fallback() {
        let result = SubFetch::Commits.extract(json!([]));

        assert!(matches!(result, Err(FetchError::Shape("empty list"))));
        assert_eq!(SubFetch::Commits.fallback(), None);
    }

    #[test]
    fn counts_collection_length() {
        let body = json!([{}, {}, {}]);

        assert_eq!(
            SubFetch::Issues.extract(body.clone()).unwrap(),
            Update::OpenedIssues(3),
        );
        assert_eq!(
            SubFetch::Contributors.extract(body.clone()).unwrap(),
            Update::Contributors(3),
        );
        assert_eq!(
            SubFetch::PullRequests.extract(body).unwrap(),
            Update::PendingPullRequests(3),
        );
    }

    #[test]
    fn counts_reject_objects() {
        let result = SubFetch::Issues.extract(json!({ "message": "Not Found" }));

        assert!(matches!(result, Err(FetchError::Shape(_))));
    }

    #[test]
    fn releases_use_first_tag() {
        let update = SubFetch::Releases.extract(json!([
            { "tag_name": "v2.0.0" },
            { "tag_name": "v1.0.0" },
        ])).unwrap();

        assert_eq!(update, Update::LastRelease("v2.0.0".to_owned()));
    }

    #[test]
    fn releases_fall_back_to_empty_tag() {
        assert!(SubFetch::Releases.extract(json!([])).is_err());
        assert_eq!(
            SubFetch::Releases.fallback(),
            Some(Update::LastRelease(String::new())),
        );
    }

    #[test]
    fn only_releases_have_a_fallback() {
        let with_fallback: Vec<_> = SubFetch::ALL.iter()
            .filter(|s| s.fallback().is_some())
            .collect();

        assert_eq!(with_fallback, [&SubFetch::Releases]);
    }
}
