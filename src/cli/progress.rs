//! CLI-specific progress handling for cityprint
//!
//! Provides progress bar implementation for the command-line interface.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a batch-count progress bar for CLI display
pub fn create_progress_bar(total_batches: u64) -> ProgressBar {
    let pb = ProgressBar::new(total_batches);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} batches ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for the fetch stages
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_batches: u64, message: &str) -> Self {
        let pb = create_progress_bar(total_batches);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }
}
