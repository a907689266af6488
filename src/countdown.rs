//! Time left until the alarm, for display only.
//! The countdown has no say in when the alarm actually rings.

use std::{
    fmt,
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::clock::Clock;

const HOUR_MS: u64 = 60 * 60 * 1000;
const MINUTE_MS: u64 = 60 * 1000;
const SECOND_MS: u64 = 1000;

/// milliseconds until the alarm, never negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Remaining(u64);

impl Remaining {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub fn until(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = (target - now).num_milliseconds();
        Self(u64::try_from(millis).unwrap_or(0))
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn hours(self) -> u64 {
        self.0 / HOUR_MS
    }

    #[must_use]
    pub const fn minutes(self) -> u64 {
        (self.0 / MINUTE_MS) % 60
    }

    #[must_use]
    pub const fn seconds(self) -> u64 {
        (self.0 / SECOND_MS) % 60
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}h {:02}m {:02}s",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// Recomputes the remaining time once per interval on a background thread
/// until it reaches zero.
///
/// Dropping the ticker stops it, so replacing the ticker when the alarm time changes
/// never leaves two sequences running.
#[derive(Debug)]
pub struct CountdownTicker {
    latest: Remaining,
    ticks: Receiver<Remaining>,
    // never sent on, dropping it wakes the thread up for good
    _cancel: Sender<()>,
}

impl CountdownTicker {
    /// `on_tick` runs after every new value, the gui uses it to request a repaint
    pub fn spawn<F>(
        target: DateTime<Utc>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        on_tick: F,
    ) -> std::io::Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let (tx, ticks) = mpsc::channel();
        let latest = Remaining::until(target, clock.now());
        thread::Builder::new()
            .name("countdown".to_string())
            .spawn(move || loop {
                let remaining = Remaining::until(target, clock.now());
                if tx.send(remaining).is_err() {
                    break;
                }
                on_tick();
                if remaining.is_zero() {
                    break;
                }
                match cancelled.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            latest,
            ticks,
            _cancel: cancel,
        })
    }

    /// the most recent tick, or the value at spawn time if none arrived yet
    pub fn latest(&mut self) -> Remaining {
        if let Some(remaining) = self.ticks.try_iter().last() {
            self.latest = remaining;
        }
        self.latest
    }

    /// blocks until the next tick, `None` once the sequence has ended
    pub fn next_tick(&mut self, timeout: Duration) -> Option<Remaining> {
        let remaining = self.ticks.recv_timeout(timeout).ok()?;
        self.latest = remaining;
        Some(remaining)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::clock::fake::FakeClock;

    const WAIT: Duration = Duration::from_secs(2);

    #[test]
    fn renders_hours_minutes_seconds() {
        assert_eq!(Remaining::from_millis(3_661_000).to_string(), "01h 01m 01s");
        assert_eq!(Remaining::from_millis(999).to_string(), "00h 00m 00s");
        assert_eq!(Remaining::from_millis(86_399_999).to_string(), "23h 59m 59s");
        assert_eq!(
            Remaining::from_millis(100 * 3_600_000).to_string(),
            "100h 00m 00s"
        );
    }

    #[test]
    fn never_negative() {
        let now = Utc::now();
        let past = now - ChronoDuration::seconds(5);
        assert_eq!(Remaining::until(past, now), Remaining::ZERO);
        assert_eq!(Remaining::until(past, now).to_string(), "00h 00m 00s");
    }

    #[test]
    fn first_tick_shows_full_time_left() {
        let clock = Arc::new(FakeClock::new());
        let target = clock.now() + ChronoDuration::milliseconds(3_661_000);
        let mut ticker =
            CountdownTicker::spawn(target, clock, Duration::from_millis(10), || {}).unwrap();
        let first = ticker.next_tick(WAIT).unwrap();
        assert_eq!(first.to_string(), "01h 01m 01s");
    }

    #[test]
    fn ends_after_reaching_zero() {
        let clock = Arc::new(FakeClock::new());
        let target = clock.now() + ChronoDuration::seconds(3);
        let mut ticker = CountdownTicker::spawn(
            target,
            clock.clone(),
            Duration::from_millis(10),
            || {},
        )
        .unwrap();
        assert_eq!(ticker.next_tick(WAIT).unwrap().to_string(), "00h 00m 03s");

        clock.advance(ChronoDuration::seconds(4));
        let mut last = None;
        while let Some(remaining) = ticker.next_tick(WAIT) {
            last = Some(remaining);
        }
        assert_eq!(last, Some(Remaining::ZERO));
        assert_eq!(ticker.latest().to_string(), "00h 00m 00s");
    }

    #[test]
    fn dropping_the_ticker_stops_the_ticks() {
        let clock = Arc::new(FakeClock::new());
        let target = clock.now() + ChronoDuration::hours(2);
        let (tx, rx) = mpsc::channel();
        let ticker = CountdownTicker::spawn(target, clock, Duration::from_millis(10), move || {
            let _ = tx.send(());
        })
        .unwrap();
        rx.recv_timeout(WAIT).unwrap();
        drop(ticker);
        // the thread drops its end of the channel on the way out
        let deadline = std::time::Instant::now() + WAIT;
        loop {
            match rx.recv_timeout(WAIT) {
                Ok(()) => assert!(std::time::Instant::now() < deadline),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => panic!("countdown kept running"),
            }
        }
    }
}
