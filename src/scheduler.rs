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


use tokio::time::{self, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;

use crate::cycle::Aggregator;

use std::future::Future;
use std::time::Duration;


/// Spawn `job` now and then once every `period`, forever.
///
/// Runs are not awaited, so a slow run overlaps the next one.
pub async fn every<F, Fut>(period: Duration, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = IntervalStream::new(interval);

    while ticks.next().await.is_some() {
        tokio::spawn(job());
    }
}

/// Aggregate at startup and then every `period`.
pub async fn run(aggregator: Aggregator, period: Duration) {
    log::info!("refreshing every {} minutes", period.as_secs() / 60);

    every(period, move || {
        let aggregator = aggregator.clone();

        async move {
            aggregator.run_cycle().await;
        }
    }).await
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_job(
        runs: &Arc<AtomicUsize>,
    ) -> impl FnMut() -> futures::future::Ready<()> {
        let runs = Arc::clone(runs);

        move || {
            runs.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_each_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = tokio::spawn(
            every(Duration::from_secs(60), counting_job(&runs)),
        );

        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);

        scheduler.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_wait_for_previous_run() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let job = {
            let started = Arc::clone(&started);
            let finished = Arc::clone(&finished);

            move || {
                let started = Arc::clone(&started);
                let finished = Arc::clone(&finished);

                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_secs(3600)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                }
            }
        };

        let scheduler = tokio::spawn(every(Duration::from_secs(60), job));

        time::sleep(Duration::from_secs(150)).await;

        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(finished.load(Ordering::SeqCst), 0);

        scheduler.abort();
    }
}
