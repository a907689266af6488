//! Delivery of alarm signals at absolute times.
//!
//! A registration is identified by its alarm id together with the signal it carries,
//! so a pending start and an immediate stop for the same alarm do not replace each other.
//! Registering again under the same identity replaces the earlier registration.

use std::{
    collections::HashMap,
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc,
    },
    thread,
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{
    clock::Clock,
    communication::{AlarmId, Message, Signal},
};

/// something that can wake us up later
pub trait AlarmPlatform {
    /// deliver `signal` for `id` once `at` has passed
    fn set(&self, id: AlarmId, signal: Signal, at: DateTime<Utc>);
    /// forget a registration, unknown ones are ignored
    fn cancel(&self, id: AlarmId, signal: Signal);
}

enum Command {
    Set {
        id: AlarmId,
        signal: Signal,
        at: DateTime<Utc>,
    },
    Cancel {
        id: AlarmId,
        signal: Signal,
    },
    #[cfg(test)]
    Pending(Sender<usize>),
}

/// timer service running on its own thread
/// due signals are sent down the channel given to [`TimerThread::spawn`]
#[derive(Debug)]
pub struct TimerThread {
    commands: Sender<Command>,
}

impl TimerThread {
    /// the thread exits once this handle is dropped
    pub fn spawn(clock: Arc<dyn Clock>, deliver: Sender<Message>) -> std::io::Result<Self> {
        let (commands, rx) = mpsc::channel();
        thread::Builder::new()
            .name("alarm-timer".to_string())
            .spawn(move || run(&rx, clock.as_ref(), &deliver))?;
        Ok(Self { commands })
    }

    /// number of registrations that have not fired yet
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        let (tx, rx) = mpsc::channel();
        if self.commands.send(Command::Pending(tx)).is_err() {
            return 0;
        }
        rx.recv().unwrap_or(0)
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::error!("alarm timer thread is gone");
        }
    }
}

impl AlarmPlatform for TimerThread {
    fn set(&self, id: AlarmId, signal: Signal, at: DateTime<Utc>) {
        self.send(Command::Set { id, signal, at });
    }

    fn cancel(&self, id: AlarmId, signal: Signal) {
        self.send(Command::Cancel { id, signal });
    }
}

fn run(commands: &Receiver<Command>, clock: &dyn Clock, deliver: &Sender<Message>) {
    let mut registered: HashMap<(AlarmId, Signal), DateTime<Utc>> = HashMap::new();
    loop {
        let now = clock.now();
        fire_due(&mut registered, now, deliver);

        let command = match registered.values().min() {
            Some(next) => {
                let wait = (*next - now).to_std().unwrap_or(Duration::ZERO);
                match commands.recv_timeout(wait) {
                    Ok(command) => command,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match commands.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            Command::Set { id, signal, at } => {
                if registered.insert((id, signal), at).is_some() {
                    log::debug!("replaced {signal} for alarm {id}");
                }
                log::info!("{signal} for alarm {id} set for {at}");
            }
            Command::Cancel { id, signal } => {
                if registered.remove(&(id, signal)).is_some() {
                    log::info!("cancelled {signal} for alarm {id}");
                } else {
                    log::debug!("nothing to cancel for {signal} on alarm {id}");
                }
            }
            #[cfg(test)]
            Command::Pending(reply) => {
                // the asker may have given up waiting
                let _ = reply.send(registered.len());
            }
        }
    }
    log::debug!("alarm timer thread exiting");
}

fn fire_due(
    registered: &mut HashMap<(AlarmId, Signal), DateTime<Utc>>,
    now: DateTime<Utc>,
    deliver: &Sender<Message>,
) {
    let mut due: Vec<_> = registered
        .iter()
        .filter(|(_, at)| **at <= now)
        .map(|(key, at)| (*at, *key))
        .collect();
    due.sort_unstable();
    for (_, key @ (id, signal)) in due {
        registered.remove(&key);
        log::debug!("delivering {signal} for alarm {id}");
        if deliver.send(Message::new(signal, id)).is_err() {
            log::warn!("no one is listening for {signal}");
        }
    }
}
