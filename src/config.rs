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


use serde::Deserialize;
use thiserror;

use std::fs;
use std::path::Path;
use std::time::Duration;


/// Environment variable consulted when the settings file has no token.
pub const TOKEN_VAR: &'static str = "GITHUB_TOKEN";

/// GitHub refuses `per_page` values above this.
const MAX_PAGE_SIZE: u8 = 100;


#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to read settings file")]
    Io(#[from] std::io::Error),

    #[error("unable to parse settings")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}


/// Process settings, read once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub organisation: String,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_page_size")]
    pub page_size: u8,

    /// Minutes between aggregation cycles.
    #[serde(default = "default_refresh_period")]
    pub refresh_period: u64,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_web_url")]
    pub web_url: String,

    /// Upper bound on sub-fetches waiting on the upstream at any one time.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    /// Seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default)]
    pub prune_missing: bool,

    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_page_size() -> u8 { MAX_PAGE_SIZE }
fn default_refresh_period() -> u64 { 60 }
fn default_port() -> u16 { 3000 }
fn default_api_url() -> String { "https://api.github.com".to_owned() }
fn default_web_url() -> String { "https://github.com".to_owned() }
fn default_max_in_flight() -> usize { 32 }
fn default_request_timeout() -> u64 { 30 }
fn default_progress() -> bool { true }

impl Settings {
    /// Read and validate settings from a TOML file.
    ///
    /// A missing `token` falls back to the `GITHUB_TOKEN` environment
    /// variable.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        let mut settings = Self::from_toml(&contents)?;

        if settings.token.is_none() {
            settings.token = std::env::var(TOKEN_VAR)
                .ok()
                .filter(|t| !t.is_empty());
        }

        Ok(settings)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        let settings: Settings = toml::from_str(contents)?;
        settings.validate()?;

        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.organisation.trim().is_empty() {
            return Err(Error::Invalid {
                key: "organisation",
                reason: "must not be empty",
            });
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Invalid {
                key: "page_size",
                reason: "must be between 1 and 100",
            });
        }

        if self.refresh_period == 0 {
            return Err(Error::Invalid {
                key: "refresh_period",
                reason: "must be at least one minute",
            });
        }

        if self.refresh_period.checked_mul(60).is_none() {
            return Err(Error::Invalid {
                key: "refresh_period",
                reason: "is too large",
            });
        }

        if self.max_in_flight == 0 {
            return Err(Error::Invalid {
                key: "max_in_flight",
                reason: "must be greater than zero",
            });
        }

        if self.request_timeout == 0 {
            return Err(Error::Invalid {
                key: "request_timeout",
                reason: "must be greater than zero",
            });
        }

        Ok(())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_period.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Web page of the named repository. Never depends on the upstream API.
    pub fn github_url(&self, repo_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.web_url.trim_end_matches('/'),
            self.organisation,
            repo_name,
        )
    }
}
