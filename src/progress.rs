use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::downloader::ProgressFn;

const BAR_TEMPLATE: &str = "{msg} [{bar:20}] {bytes:>10}/{total_bytes:<10} ({bytes_per_sec})";
const SPINNER_TEMPLATE: &str = "{spinner} {msg} {bytes:>10} ({bytes_per_sec})";

/// Returns the default progress function, drawing an `indicatif` bar on stdout.
///
/// The bar is created on the first callback, since the total size is only
/// known once the response headers arrive. An unknown size gets a spinner.
pub fn default_progress_fn() -> ProgressFn {
    let bar: Mutex<Option<ProgressBar>> = Mutex::new(None);

    Arc::new(move |name: &str, current: u64, total: u64, _mib_per_sec: f64, complete: bool| {
        let Ok(mut guard) = bar.lock() else { return };
        let pb = guard.get_or_insert_with(|| new_bar(name, total));
        pb.set_position(current);

        if complete {
            pb.finish();
            *guard = None;
        }
    })
}

fn new_bar(name: &str, total: u64) -> ProgressBar {
    let (pb, template) = if total > 0 {
        (ProgressBar::new(total), BAR_TEMPLATE)
    } else {
        (ProgressBar::new_spinner(), SPINNER_TEMPLATE)
    };
    pb.set_draw_target(ProgressDrawTarget::stdout());
    if let Ok(style) = ProgressStyle::with_template(template) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(name.to_owned());
    pb
}
