use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress of an ingestion run: overall, successful and failed tickers.
///
/// Hidden bars are used when the run is traced instead of drawn, so callers never branch on it.
#[derive(Clone)]
pub struct RunProgress {
    _multi: Option<MultiProgress>,
    total: ProgressBar,
    success: ProgressBar,
    fails: ProgressBar,
}

impl RunProgress {
    pub fn hidden() -> Self {
        Self {
            _multi: None,
            total: ProgressBar::hidden(),
            success: ProgressBar::hidden(),
            fails: ProgressBar::hidden(),
        }
    }

    pub fn new(len: usize) -> anyhow::Result<Self> {
        // overall multi progress bar
        let multi = MultiProgress::new();

        // total number of tickers to collect
        let total = multi.add(
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.magenta}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, Rate: {per_sec}, ETA: {eta}]",
                    )?
                    .progress_chars("## "),
            ),
        );
        total.set_message("total");
        total.enable_steady_tick(Duration::from_millis(100));

        // total successful collections
        let success = multi.insert_after(
            &total,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.green} |{bar:57.green}| {pos:<2.green}")?
                    .progress_chars("## "),
            ),
        );
        success.set_message("successes");

        // total failed collections
        let fails = multi.insert_after(
            &success,
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(" {msg:>9.red} |{bar:57.red}| {pos:<2.red}")?
                    .progress_chars("## "),
            ),
        );
        fails.set_message("failures");

        Ok(Self {
            _multi: Some(multi),
            total,
            success,
            fails,
        })
    }

    /// Drawn bars when `tui` is set, hidden ones otherwise.
    pub fn for_run(len: usize, tui: bool) -> Self {
        if !tui {
            return Self::hidden();
        }
        Self::new(len).unwrap_or_else(|err| {
            tracing::warn!("failed to build progress bars, error({err})");
            Self::hidden()
        })
    }

    pub fn succeeded(&self) {
        self.total.inc(1);
        self.success.inc(1);
    }

    pub fn failed(&self) {
        self.total.inc(1);
        self.fails.inc(1);
    }

    pub fn finish(&self) {
        self.total.finish_and_clear();
        self.success.finish_and_clear();
        self.fails.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> (u64, u64, u64) {
        (
            self.total.position(),
            self.success.position(),
            self.fails.position(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_through_hidden_bars() {
        let progress = RunProgress::for_run(3, false);
        progress.succeeded();
        progress.failed();
        progress.succeeded();
        assert_eq!(progress.position(), (3, 2, 1));
        progress.finish();
    }
}
