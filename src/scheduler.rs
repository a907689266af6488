use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    clock::Clock,
    communication::{ALARM_ID, Signal},
    platform::AlarmPlatform,
    selector::WindowHours,
};

/// Picks the random alarm time and talks to the timer service.
#[derive(Debug)]
pub struct Scheduler<P, R = StdRng> {
    platform: P,
    clock: Arc<dyn Clock>,
    rng: R,
    fire_at: Option<DateTime<Utc>>,
}

impl<P: AlarmPlatform> Scheduler<P> {
    #[must_use]
    pub fn new(platform: P, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(platform, clock, StdRng::from_entropy())
    }
}

impl<P: AlarmPlatform, R: Rng> Scheduler<P, R> {
    pub fn with_rng(platform: P, clock: Arc<dyn Clock>, rng: R) -> Self {
        Self {
            platform,
            clock,
            rng,
            fire_at: None,
        }
    }

    /// Schedules the alarm somewhere in the next `hours`, replacing any pending one.
    ///
    /// The draw is over whole milliseconds and includes one extra millisecond past the
    /// end of the window.
    pub fn activate(&mut self, hours: WindowHours) -> DateTime<Utc> {
        let now = self.clock.now();
        let offset = self.rng.gen_range(0..=hours.as_millis() + 1);
        let fire_at = now + Duration::milliseconds(offset);
        self.platform.set(ALARM_ID, Signal::Start, fire_at);
        self.fire_at = Some(fire_at);
        log::info!(
            "alarm set for {} (window of {hours})",
            fire_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
        );
        fire_at
    }

    /// Cancels the pending alarm, if there is one.
    pub fn deactivate(&mut self) {
        self.platform.cancel(ALARM_ID, Signal::Start);
        if self.fire_at.take().is_some() {
            log::info!("alarm cancelled");
        }
    }

    /// Silences a ringing alarm.
    ///
    /// Goes through the timer service like a real alarm so the trigger handler
    /// only ever hears from one place.
    pub fn stop_active(&mut self) {
        self.platform.set(ALARM_ID, Signal::Stop, self.clock.now());
        log::info!("asked the alarm to stop");
    }

    /// Cancels the pending alarm and silences it in case it already went off.
    ///
    /// A stop with nothing ringing is ignored by the trigger handler, so this is safe
    /// whether or not the alarm time has passed.
    pub fn dismiss(&mut self) {
        self.deactivate();
        self.stop_active();
    }

    #[must_use]
    pub const fn fire_at(&self) -> Option<DateTime<Utc>> {
        self.fire_at
    }

    pub const fn platform(&self) -> &P {
        &self.platform
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, Ordering},
            mpsc::{self, TryRecvError},
        },
        thread,
        time::{Duration as StdDuration, Instant},
    };

    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::{
        audio::Player,
        clock::{fake::FakeClock, SystemClock},
        communication::{AlarmId, Message},
        platform::TimerThread,
        trigger::spawn_trigger_handler,
    };

    #[derive(Debug, Default)]
    struct RecordingPlatform {
        registered: RefCell<HashMap<(AlarmId, Signal), DateTime<Utc>>>,
    }

    impl AlarmPlatform for RecordingPlatform {
        fn set(&self, id: AlarmId, signal: Signal, at: DateTime<Utc>) {
            self.registered.borrow_mut().insert((id, signal), at);
        }

        fn cancel(&self, id: AlarmId, signal: Signal) {
            self.registered.borrow_mut().remove(&(id, signal));
        }
    }

    fn scheduler(clock: Arc<FakeClock>, seed: u64) -> Scheduler<RecordingPlatform> {
        Scheduler::with_rng(
            RecordingPlatform::default(),
            clock,
            StdRng::seed_from_u64(seed),
        )
    }

    #[test]
    fn fire_time_stays_inside_the_window() {
        let clock = Arc::new(FakeClock::new());
        let now = clock.now();
        let mut scheduler = scheduler(clock, 7);
        for hours in WindowHours::MIN..=WindowHours::MAX {
            let hours = WindowHours::new(hours);
            for _ in 0..50 {
                let fire_at = scheduler.activate(hours);
                assert!(fire_at >= now);
                assert!(fire_at <= now + Duration::milliseconds(hours.as_millis() + 1));
            }
        }
    }

    #[test]
    fn activate_registers_a_start_for_the_fixed_id() {
        let clock = Arc::new(FakeClock::new());
        let mut scheduler = scheduler(clock, 1);
        let fire_at = scheduler.activate(WindowHours::new(3));
        let registered = scheduler.platform().registered.borrow();
        assert_eq!(registered.get(&(ALARM_ID, Signal::Start)), Some(&fire_at));
        assert_eq!(scheduler.fire_at(), Some(fire_at));
    }

    #[test]
    fn deactivate_then_activate_leaves_one_alarm() {
        let clock = Arc::new(FakeClock::new());
        let mut scheduler = scheduler(clock, 2);
        scheduler.activate(WindowHours::new(5));
        scheduler.deactivate();
        assert!(scheduler.platform().registered.borrow().is_empty());
        assert_eq!(scheduler.fire_at(), None);
        scheduler.activate(WindowHours::new(5));
        assert_eq!(scheduler.platform().registered.borrow().len(), 1);
    }

    #[test]
    fn deactivate_without_alarm_is_fine() {
        let clock = Arc::new(FakeClock::new());
        let mut scheduler = scheduler(clock, 3);
        scheduler.deactivate();
        assert!(scheduler.platform().registered.borrow().is_empty());
    }

    #[test]
    fn stop_is_due_right_away() {
        let clock = Arc::new(FakeClock::new());
        let now = clock.now();
        let mut scheduler = scheduler(clock, 4);
        scheduler.stop_active();
        let registered = scheduler.platform().registered.borrow();
        assert_eq!(registered.get(&(ALARM_ID, Signal::Stop)), Some(&now));
    }

    #[test]
    fn cancelled_alarm_never_starts() {
        let (tx, rx) = mpsc::channel::<Message>();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let timer = TimerThread::spawn(Arc::clone(&clock), tx).unwrap();
        let mut scheduler = Scheduler::new(timer, clock);

        scheduler.activate(WindowHours::new(2));
        scheduler.deactivate();
        assert_eq!(scheduler.platform().pending(), 0);

        scheduler.stop_active();
        let message = rx.recv_timeout(StdDuration::from_secs(2)).unwrap();
        assert_eq!(message.kind, Signal::Stop);
        thread::sleep(StdDuration::from_millis(50));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[derive(Debug)]
    struct FlagPlayer {
        playing: Arc<AtomicBool>,
    }

    impl Player for FlagPlayer {
        fn play(&mut self) {
            self.playing.store(true, Ordering::SeqCst);
        }

        fn is_playing(&self) -> bool {
            self.playing.load(Ordering::SeqCst)
        }

        fn stop(&mut self) {
            self.playing.store(false, Ordering::SeqCst);
        }

        fn release(self) {}
    }

    fn wait_for(what: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + StdDuration::from_secs(2);
        while Instant::now() < deadline {
            if what() {
                return true;
            }
            thread::sleep(StdDuration::from_millis(5));
        }
        what()
    }

    #[test]
    fn dismissing_after_the_alarm_rang_silences_it() {
        let playing = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let player_flag = Arc::clone(&playing);
        let _handler = spawn_trigger_handler(rx, move || {
            Ok(FlagPlayer {
                playing: Arc::clone(&player_flag),
            })
        })
        .unwrap();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let timer = TimerThread::spawn(Arc::clone(&clock), tx).unwrap();
        // always draws the start of the window, so the alarm is due right away
        let mut scheduler = Scheduler::with_rng(timer, clock, StepRng::new(0, 0));

        scheduler.activate(WindowHours::new(2));
        assert!(wait_for(|| playing.load(Ordering::SeqCst)));

        scheduler.dismiss();
        assert_eq!(scheduler.fire_at(), None);
        assert!(wait_for(|| !playing.load(Ordering::SeqCst)));
        assert_eq!(scheduler.platform().pending(), 0);
    }

    #[test]
    fn dismissing_before_the_alarm_rang_cancels_it() {
        let clock = Arc::new(FakeClock::new());
        let now = clock.now();
        let mut scheduler = scheduler(clock, 5);
        scheduler.activate(WindowHours::new(2));
        scheduler.dismiss();

        let registered = scheduler.platform().registered.borrow();
        assert_eq!(registered.get(&(ALARM_ID, Signal::Start)), None);
        assert_eq!(registered.get(&(ALARM_ID, Signal::Stop)), Some(&now));
    }
}
