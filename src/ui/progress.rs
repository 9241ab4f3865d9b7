use crate::extractor::UnitProgress;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_unit_progress(&self, total_units: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_units));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>5}/{len:5} units {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        pb.set_message("Starting search...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb
    }
}

/// Moves the bar to the unit about to be processed and shows its status line.
pub fn update_unit_progress(pb: &ProgressBar, progress: &UnitProgress) {
    pb.set_position(progress.index.saturating_sub(1) as u64);
    pb.set_message(progress.status_line());
    // redraw now instead of waiting for the next steady tick
    pb.tick();
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_progress_bar_tracks_units() {
        let manager = ProgressManager::new(true);
        let pb = manager.create_unit_progress(27);
        assert_eq!(pb.length(), Some(27));
        pb.finish_and_clear();
    }

    #[test]
    fn test_disabled_progress_bars() {
        let manager = ProgressManager::new(false);

        let unit_pb = manager.create_unit_progress(27);
        assert!(unit_pb.is_hidden());

        let spinner = manager.create_spinner("writing output.xlsx");
        assert!(spinner.is_hidden());
    }

    #[test]
    fn test_update_unit_progress() {
        let pb = ProgressBar::hidden();
        pb.set_length(3);

        update_unit_progress(
            &pb,
            &UnitProgress {
                index: 2,
                total: 3,
                serial: 101,
                unit_prefix: "SN".to_string(),
            },
        );

        assert_eq!(pb.position(), 1);
        assert_eq!(pb.message(), "Processing: 2 of 3: SN101");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }
}
