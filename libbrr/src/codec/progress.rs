//! progress reporting for long encodes

/// observer for an encode pass
///
/// `report` is called on the encoding thread right after a block is
/// committed, and only when the integer percentage changes.
/// `should_cancel` is polled at the same check-points; returning `true`
/// stops the encode with [`BrrError::Cancelled`](crate::BrrError::Cancelled).
pub trait Progress {
    fn report(&mut self, percent: u8);

    fn should_cancel(&self) -> bool {
        false
    }
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// dedupes percentages before they reach the observer
pub(crate) struct ProgressTracker<'a, P: Progress + ?Sized> {
    observer: &'a mut P,
    last: Option<u8>,
}

impl<'a, P: Progress + ?Sized> ProgressTracker<'a, P> {
    /// reports 0 straight away
    pub(crate) fn start(observer: &'a mut P) -> Self {
        let mut tracker = ProgressTracker {
            observer,
            last: None,
        };
        tracker.set(0);
        tracker
    }

    pub(crate) fn set(&mut self, percent: u8) {
        if self.last != Some(percent) {
            self.observer.report(percent);
            self.last = Some(percent);
        }
    }

    pub(crate) fn blocks_done(&mut self, done: usize, total: usize) {
        let percent = if total == 0 { 100 } else { done * 100 / total };
        self.set(percent.min(100) as u8);
    }

    pub(crate) fn should_cancel(&self) -> bool {
        self.observer.should_cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_only_on_change() {
        let mut seen = Vec::new();
        let mut observer = |p: u8| seen.push(p);
        {
            let mut tracker = ProgressTracker::start(&mut observer);
            for done in 1..=300 {
                tracker.blocks_done(done, 300);
            }
            tracker.set(100);
        }
        assert_eq!(seen.len(), 101);
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
