use indicatif::{ProgressBar, ProgressStyle};

/// Template shared by every export progress bar
const TEMPLATE: &str = concat!(
    "{spinner:.green} [{elapsed}] [{bar:.blue}] ",
    "{human_pos}/{human_len} ({per_sec}, ETA: {eta}) {msg}"
);

/// Build a progress bar for `total_items` inputs, or a hidden one when output goes to stdout
pub fn build_progress_bar_export(total_items: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total_items);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
