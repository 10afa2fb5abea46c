use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};

use crate::downloader::{DownloadProgress, ProgressFn};

const TEMPLATE: &str =
    "{prefix} {bytes}/{total_bytes} [{bar:40.cyan/blue}] {percent}% {elapsed_precise} {bytes_per_sec}";
const SPINNER_TEMPLATE: &str = "{prefix} {spinner} {bytes} {elapsed_precise} {bytes_per_sec}";

/// Creates the progress bar used for non-interactive downloads.
///
/// The length is unknown until the first report arrives, so the bar starts
/// as a spinner and switches to a bar once a total is known.
pub fn create_progress_bar(label: &str) -> ProgressBar {
    let pb = ProgressBar::no_length();
    pb.set_style(spinner_style());
    pb.set_prefix(label.to_owned());
    pb
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Returns a progress function that drives `pb`.
pub fn progress_bar_fn(pb: ProgressBar) -> ProgressFn {
    Arc::new(move |progress: &DownloadProgress| {
        match progress.total {
            Some(total) if total > 0 && pb.length() != Some(total) => {
                pb.set_style(bar_style());
                pb.set_length(total);
            }
            _ => {}
        }
        pb.set_position(progress.bytes);
    })
}
