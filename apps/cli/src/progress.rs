use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;
use udemy_dl::downloader::ProgressReporter;

const BAR_STYLE: &str =
    "{prefix:.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_STYLE: &str = "{spinner:.blue} {prefix:.bold} {bytes} ({bytes_per_sec})";

/// One progress bar per lecture, drawn on stderr
#[derive(Debug, Default)]
pub struct BarReporter {
    verbose: bool,
    state: Mutex<BarState>,
}

#[derive(Debug, Default)]
struct BarState {
    label: String,
    bar: Option<ProgressBar>,
}

impl BarReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            state: Mutex::default(),
        }
    }

    fn with_state<F: FnOnce(&mut BarState)>(&self, f: F) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_bar())
}

impl ProgressReporter for BarReporter {
    fn on_lecture_started(&self, label: &str, path: &Path) {
        let verbose = self.verbose;
        self.with_state(|state| {
            state.label = label.to_string();
            if verbose {
                println!("Downloading {}", path.display());
            }
        });
    }

    fn on_lecture_skipped(&self, label: &str, reason: &str) {
        println!("Skipping {}: {}", label, reason);
    }

    fn on_download_started(&self, _url: &str, resumed_from: u64, total_size: Option<u64>) {
        self.with_state(|state| {
            let bar = match total_size {
                Some(total) => ProgressBar::new(total).with_style(style(BAR_STYLE)),
                None => ProgressBar::new_spinner().with_style(style(SPINNER_STYLE)),
            };
            bar.set_prefix(state.label.clone());
            bar.set_position(resumed_from);
            state.bar = Some(bar);
        });
    }

    fn on_download_progress(&self, _url: &str, downloaded: u64, _total: Option<u64>, _speed_bps: f64) {
        self.with_state(|state| {
            if let Some(bar) = &state.bar {
                bar.set_position(downloaded);
            }
        });
    }

    fn on_download_complete(&self, _url: &str, final_size: u64) {
        self.with_state(|state| {
            if let Some(bar) = state.bar.take() {
                bar.set_position(final_size);
                bar.finish();
            }
        });
    }

    fn on_fallback(&self, _url: &str, reason: &str) {
        self.with_state(|state| {
            if let Some(bar) = state.bar.take() {
                bar.finish_and_clear();
            }
            if self.verbose {
                println!("{}: {}, fetching whole file", state.label, reason);
            }
        });
    }

    fn on_cancelled(&self, _url: &str) {
        self.with_state(|state| {
            if let Some(bar) = state.bar.take() {
                bar.abandon_with_message("interrupted");
            }
        });
    }

    fn on_warning(&self, _url: &str, message: &str) {
        eprintln!("warning: {}", message);
    }

    fn on_error(&self, _url: &str, error: &str) {
        self.with_state(|state| {
            if let Some(bar) = state.bar.take() {
                bar.abandon();
            }
            eprintln!("Cannot download lecture \"{}\": {}", state.label, error);
        });
    }
}
