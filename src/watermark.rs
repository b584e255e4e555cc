use chrono::{DateTime, Utc};

/// Start time of the last cycle whose fetch completed.
///
/// Begins at the Unix epoch, so the first cycle requests every issue. Never
/// moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark(DateTime<Utc>);

impl Default for Watermark {
    fn default() -> Self {
        // DateTime<Utc>::default() is the Unix epoch.
        Self(DateTime::<Utc>::default())
    }
}

impl Watermark {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    pub fn get(&self) -> DateTime<Utc> {
        self.0
    }

    /// Move to `to` if it is later than the current mark. Returns whether
    /// the mark moved.
    pub fn advance(&mut self, to: DateTime<Utc>) -> bool {
        if to > self.0 {
            self.0 = to;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_starts_at_epoch() {
        assert_eq!(Watermark::default().get().timestamp(), 0);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let now = Utc::now();
        let mut mark = Watermark::new(now);

        assert!(!mark.advance(now - Duration::minutes(5)));
        assert_eq!(mark.get(), now);

        assert!(!mark.advance(now));
        assert!(mark.advance(now + Duration::seconds(5)));
        assert_eq!(mark.get(), now + Duration::seconds(5));
    }
}
