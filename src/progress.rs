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


use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};


const BAR_TEMPLATE: &'static str = "{prefix:>12.bold.cyan} [{bar:25}] {pos}/{len} {msg}";
const SPINNER_TEMPLATE: &'static str = "{prefix:>12.bold.cyan} {spinner} {msg}";


/// Console progress of one aggregation cycle.
///
/// Shows a spinner while the repository list is paginated, then a bar of
/// repositories whose sub-fetches have all resolved.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(visible: bool) -> Self {
        let bar = ProgressBar::hidden();

        if visible {
            bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        Self { bar }
    }

    /// A reporter that never draws.
    pub fn hidden() -> Self {
        Self::new(false)
    }

    pub fn listing_page(&self, organisation: &str, page: u32) {
        if page == 1 {
            self.bar.set_style(style(SPINNER_TEMPLATE, ProgressStyle::default_spinner()));
            self.bar.set_prefix("Listing");
        }

        log::debug!("listing {}: page {}", organisation, page);

        self.bar.set_message(format!("{} page {}", organisation, page));
        self.bar.tick();
    }

    pub fn start(&self, total: usize) {
        self.bar.set_style(style(BAR_TEMPLATE, ProgressStyle::default_bar()));
        self.bar.set_prefix("Aggregating");
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message("");
    }

    /// Record that `repo_name` is fully aggregated.
    pub fn advance(&self, repo_name: &str, completed: usize, total: usize) {
        log::debug!(
            "{} done ({}/{}, {:.0}%)",
            repo_name,
            completed,
            total,
            fraction(completed, total) * 100.0,
        );

        self.bar.set_position(completed as u64);
        self.bar.set_message(repo_name.to_owned());
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}


/// Share of `total` that is complete, 1.0 for an empty cycle.
pub fn fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

fn style(template: &str, fallback: ProgressStyle) -> ProgressStyle {
    match fallback.clone().template(template) {
        Ok(style) => style.progress_chars("=> "),
        Err(_) => fallback,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_of_total() {
        assert_eq!(fraction(0, 4), 0.0);
        assert_eq!(fraction(1, 4), 0.25);
        assert_eq!(fraction(4, 4), 1.0);
        assert_eq!(fraction(0, 0), 1.0);
    }

    #[test]
    fn hidden_reporter_tracks_position() {
        let progress = ProgressReporter::hidden();
        progress.listing_page("acme", 1);
        progress.start(3);
        progress.advance("a", 1, 3);
        progress.advance("b", 2, 3);

        assert_eq!(progress.position(), 2);

        progress.finish();
    }
}
