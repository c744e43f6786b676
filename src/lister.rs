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


use futures::stream::{self, Stream};

use crate::github;


/// Lazily walk an organisation's repository listing, one page at a time.
///
/// Pagination starts at page 1 and stops at the first empty page. A failed
/// request is logged and ends the listing; whatever was yielded before it
/// stands as the complete list. Every call starts over from page 1.
pub fn pages<'a>(
    client: &'a github::Client,
    organisation: &'a str,
    per_page: u8,
) -> impl Stream<Item = (u32, Vec<String>)> + 'a {
    stream::unfold(1u32, move |page| async move {
        match client.org_repos(organisation, page, per_page).await {
            Ok(repos) if repos.is_empty() => None,
            Ok(repos) => {
                let names: Vec<String> = repos.into_iter()
                    .map(|r| r.name)
                    .collect();

                Some(((page, names), page + 1))
            },
            Err(e) => {
                log::warn!(
                    "listing {} stopped at page {}: {:#}",
                    organisation,
                    page,
                    anyhow::Error::new(e),
                );

                None
            },
        }
    })
}

/// Sort names case-insensitively. Names that compare equal keep their
/// listing order.
pub fn sort_names(names: &mut [String]) {
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()));
}
