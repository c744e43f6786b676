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


use crate::record::Projects;

use std::sync::{Arc, PoisonError, RwLock};


#[derive(Debug, Default)]
struct Published {
    cycle: u64,
    projects: Arc<Projects>,
}


/// Holds the most recently completed aggregation.
///
/// Readers get a consistent view; a cycle's results replace it in one swap.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<RwLock<Published>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot. Empty until the first cycle completes.
    pub fn current(&self) -> Arc<Projects> {
        let published = self.inner.read()
            .unwrap_or_else(PoisonError::into_inner);

        Arc::clone(&published.projects)
    }

    /// Id of the cycle whose results are current, 0 if none.
    pub fn cycle(&self) -> u64 {
        self.inner.read()
            .unwrap_or_else(PoisonError::into_inner)
            .cycle
    }

    /// Replace the snapshot with the results of `cycle`.
    ///
    /// Results of a cycle older than the current one are dropped and
    /// `false` is returned.
    pub fn publish(&self, cycle: u64, projects: Projects) -> bool {
        let mut published = self.inner.write()
            .unwrap_or_else(PoisonError::into_inner);

        if cycle < published.cycle {
            return false;
        }

        *published = Published {
            cycle,
            projects: Arc::new(projects),
        };

        true
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::RepositoryRecord;

    fn projects(names: &[&str]) -> Projects {
        let mut projects = Projects::new();
        for name in names {
            projects.insert(
                name.to_string(),
                RepositoryRecord::new(format!("https://github.com/acme/{}", name)),
            );
        }

        projects
    }

    #[test]
    fn starts_empty() {
        let store = Store::new();

        assert!(store.current().is_empty());
        assert_eq!(store.cycle(), 0);
    }

    #[test]
    fn publish_swaps_whole_snapshot() {
        let store = Store::new();
        assert!(store.publish(1, projects(&["a", "b"])));

        let before = store.current();
        assert!(store.publish(2, projects(&["c"])));

        assert_eq!(before.len(), 2);
        assert_eq!(store.current().names(), ["c"]);
        assert_eq!(store.cycle(), 2);
    }

    #[test]
    fn older_cycle_is_not_published() {
        let store = Store::new();
        store.publish(3, projects(&["new"]));

        assert!(!store.publish(2, projects(&["old"])));
        assert_eq!(store.current().names(), ["new"]);
    }

    #[test]
    fn clones_share_snapshot() {
        let store = Store::new();
        let reader = store.clone();
        store.publish(1, projects(&["a"]));

        assert!(reader.current().contains("a"));
    }
}
