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
use serde::{Deserialize, Serialize, Serializer};
use serde::ser::SerializeMap;

use std::collections::HashMap;


/// Aggregated metadata of one repository.
///
/// Fields other than `github_url` are only present once the sub-fetch that
/// owns them has succeeded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub github_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_issues: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributors: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_pull_requests: Option<usize>,

    /// Tag of the latest release. Empty when the repository has no release
    /// or the releases could not be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_release: Option<String>,
}

impl RepositoryRecord {
    pub fn new(github_url: String) -> Self {
        RepositoryRecord {
            github_url,
            ..Default::default()
        }
    }

    pub fn apply(&mut self, update: Update) {
        match update {
            Update::Metadata { created_on, description, website_url } => {
                self.created_on = created_on;
                self.description = description;
                self.website_url = website_url;
            },
            Update::LastCommit(date) => self.last_commit_on = Some(date),
            Update::OpenedIssues(n) => self.opened_issues = Some(n),
            Update::Contributors(n) => self.contributors = Some(n),
            Update::PendingPullRequests(n) => {
                self.pending_pull_requests = Some(n);
            },
            Update::LastRelease(tag) => self.last_release = Some(tag),
        }
    }
}


/// Fields learned from one successful sub-fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Metadata {
        created_on: Option<DateTime<Utc>>,
        description: Option<String>,
        website_url: Option<String>,
    },
    LastCommit(DateTime<Utc>),
    OpenedIssues(usize),
    Contributors(usize),
    PendingPullRequests(usize),
    LastRelease(String),
}


/// Records of every repository of an organisation, keyed by name.
///
/// Serializes as a JSON object whose keys are in case-insensitive order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projects(HashMap<String, RepositoryRecord>);

impl Projects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryRecord> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RepositoryRecord> {
        self.0.get_mut(name)
    }

    pub fn insert(&mut self, name: String, record: RepositoryRecord) {
        self.0.insert(name, record);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RepositoryRecord)> {
        self.0.iter()
    }

    /// Names in case-insensitive order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys()
            .map(String::as_str)
            .collect();
        names.sort_by(|a, b| {
            a.to_lowercase().cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });

        names
    }
}

impl Serialize for Projects {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;

        for name in self.names() {
            map.serialize_entry(name, &self.0[name])?;
        }

        map.end()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn placeholder_serializes_only_url() {
        let record = RepositoryRecord::new(
            "https://github.com/acme/widget".to_owned(),
        );

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "github_url": "https://github.com/acme/widget" }),
        );
    }

    #[test]
    fn apply_sets_only_owned_fields() {
        let mut record = RepositoryRecord::new("u".to_owned());
        record.apply(Update::OpenedIssues(0));
        record.apply(Update::LastRelease(String::new()));

        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "github_url": "u",
                "opened_issues": 0,
                "last_release": "",
            }),
        );
    }

    #[test]
    fn timestamps_serialize_as_rfc3339() {
        let mut record = RepositoryRecord::new("u".to_owned());
        record.apply(Update::LastCommit(
            Utc.with_ymd_and_hms(2021, 6, 1, 12, 30, 0).unwrap(),
        ));

        assert_eq!(
            serde_json::to_value(&record).unwrap()["last_commit_on"],
            "2021-06-01T12:30:00Z",
        );
    }

    #[test]
    fn metadata_replaces_all_three_fields() {
        let mut record = RepositoryRecord::new("u".to_owned());
        record.description = Some("old".to_owned());
        record.apply(Update::Metadata {
            created_on: None,
            description: None,
            website_url: Some("https://example.com".to_owned()),
        });

        assert_eq!(record.description, None);
        assert_eq!(record.website_url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn projects_serialize_in_case_insensitive_order() {
        let mut projects = Projects::new();
        projects.insert("Beta".to_owned(), RepositoryRecord::new("b".to_owned()));
        projects.insert("alpha".to_owned(), RepositoryRecord::new("a".to_owned()));
        projects.insert("Charlie".to_owned(), RepositoryRecord::new("c".to_owned()));

        let body = serde_json::to_string(&projects).unwrap();

        assert_eq!(
            body,
            r#"{"alpha":{"github_url":"a"},"Beta":{"github_url":"b"},"Charlie":{"github_url":"c"}}"#,
        );
    }
}
