//! Spinner shown while a download is in flight

use crate::output::format_bytes;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use qnlink_types::FetchResult;
use std::time::Duration;

pub struct DownloadSpinner {
    bar: ProgressBar,
}

impl DownloadSpinner {
    pub fn start(target: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(spinner_style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(spinner_style);
        }
        bar.set_message(target.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(self, result: &FetchResult) {
        if result.is_ok() {
            self.bar.finish_with_message(format!(
                "{} Download complete ({})",
                style("✓").green().bold(),
                format_bytes(result.payload_len())
            ));
        } else {
            self.bar.abandon_with_message(format!(
                "{} Failed: code = {}",
                style("✗").red().bold(),
                result.code
            ));
        }
    }
}
