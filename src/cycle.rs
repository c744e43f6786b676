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


use tokio::sync::Semaphore;
use tokio_stream::StreamExt;

use crate::aggregate;
use crate::config::Settings;
use crate::github;
use crate::lister;
use crate::progress::ProgressReporter;
use crate::record::{Projects, Update};
use crate::snapshot::Store;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};


/// State of one aggregation cycle, shared by its repository tasks.
///
/// Records are built in a buffer private to the cycle and handed to the
/// store once every repository is done.
#[derive(Debug)]
pub struct Cycle {
    id: u64,
    total: usize,
    completed: AtomicUsize,
    projects: Mutex<Option<Projects>>,
    progress: ProgressReporter,
}

impl Cycle {
    /// Start a cycle over `names`, seeding each record from `previous`
    /// with its `github_url` set.
    ///
    /// Unless `prune_missing` is set, repositories of `previous` missing
    /// from `names` are kept as they are.
    pub fn new(
        id: u64,
        names: &[String],
        previous: &Projects,
        settings: &Settings,
        progress: ProgressReporter,
    ) -> Self {
        let mut projects = Projects::new();

        for name in names {
            let mut record = previous.get(name)
                .cloned()
                .unwrap_or_default();
            record.github_url = settings.github_url(name);

            projects.insert(name.clone(), record);
        }

        if !settings.prune_missing {
            for (name, record) in previous.iter() {
                if !projects.contains(name) {
                    projects.insert(name.clone(), record.clone());
                }
            }
        }

        progress.start(names.len());

        Cycle {
            id,
            total: names.len(),
            completed: AtomicUsize::new(0),
            projects: Mutex::new(Some(projects)),
            progress,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Copy of the records as they stand. `None` once the cycle has
    /// handed its records over.
    #[cfg(test)]
    fn projects(&self) -> Option<Projects> {
        self.projects.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn apply(&self, repo_name: &str, update: Update) {
        let mut projects = self.projects.lock()
            .unwrap_or_else(PoisonError::into_inner);

        match projects.as_mut().and_then(|p| p.get_mut(repo_name)) {
            Some(record) => record.apply(update),
            None => log::debug!(
                "cycle {}: dropped late update for {}",
                self.id,
                repo_name,
            ),
        }
    }

    /// Count `repo_name` as fully aggregated.
    ///
    /// The call that completes the last repository takes the records and
    /// returns them; every other call returns `None`.
    pub fn finish_repository(&self, repo_name: &str) -> Option<Projects> {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;

        self.progress.advance(repo_name, completed, self.total);

        if completed != self.total {
            return None;
        }

        self.progress.finish();

        self.projects.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}


/// Outcome of [`Aggregator::run_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub id: u64,
    pub total: usize,
    pub completed: usize,
    pub published: bool,
}


/// Runs aggregation cycles for one organisation and publishes their
/// results to a [`Store`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: github::Client,
    settings: Arc<Settings>,
    store: Store,
    permits: Arc<Semaphore>,
    last_cycle: Arc<AtomicU64>,
}

impl Aggregator {
    pub fn new(client: github::Client, settings: Arc<Settings>, store: Store) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_in_flight));

        Aggregator {
            client,
            settings,
            store,
            permits,
            last_cycle: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// List the organisation's repositories and aggregate all of them.
    ///
    /// Each repository is aggregated on its own task; the cycle's results
    /// are published when the last one finishes. Returns after every task
    /// has ended.
    pub async fn run_cycle(&self) -> CycleReport {
        let id = self.last_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let organisation = self.settings.organisation.as_str();
        let progress = ProgressReporter::new(self.settings.progress);

        log::info!("cycle {}: listing {} repositories", id, organisation);

        let mut names = Vec::new();
        let pages = lister::pages(&self.client, organisation, self.settings.page_size);
        tokio::pin!(pages);

        while let Some((page, page_names)) = pages.next().await {
            progress.listing_page(organisation, page);
            names.extend(page_names);
        }

        if names.is_empty() {
            progress.finish();
            log::info!("cycle {}: no repositories found", id);

            return CycleReport {
                id,
                total: 0,
                completed: 0,
                published: false,
            };
        }

        lister::sort_names(&mut names);

        log::info!(
            "{}'s {} public projects: {}",
            organisation,
            names.len(),
            names.join(", "),
        );

        let cycle = Arc::new(Cycle::new(
            id,
            &names,
            &self.store.current(),
            &self.settings,
            progress,
        ));

        let tasks: Vec<_> = names.into_iter()
            .map(|name| {
                let aggregator = self.clone();
                let cycle = Arc::clone(&cycle);

                tokio::spawn(async move {
                    aggregator.aggregate_repository(&cycle, &name).await
                })
            })
            .collect();

        let mut published = false;

        for task in tasks {
            match task.await {
                Ok(was_published) => published |= was_published,
                Err(e) => log::error!("cycle {}: aggregation task failed: {}", id, e),
            }
        }

        log::info!(
            "cycle {}: {} of {} repositories aggregated",
            id,
            cycle.completed(),
            cycle.total(),
        );

        CycleReport {
            id,
            total: cycle.total(),
            completed: cycle.completed(),
            published,
        }
    }

    async fn aggregate_repository(&self, cycle: &Cycle, repo_name: &str) -> bool {
        aggregate::aggregate(
            &self.client,
            &self.permits,
            &self.settings.organisation,
            repo_name,
            cycle,
        ).await;

        match cycle.finish_repository(repo_name) {
            Some(projects) => {
                let published = self.store.publish(cycle.id(), projects);

                if published {
                    log::info!("cycle {}: snapshot published", cycle.id());
                } else {
                    log::info!(
                        "cycle {}: superseded by cycle {}, results dropped",
                        cycle.id(),
                        self.store.cycle(),
                    );
                }

                published
            },
            None => false,
        }
    }
}
