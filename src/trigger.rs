//! Reacts to alarm signals by starting and stopping the alarm sound.
//!
//! The handler owns the only player. It is created the first time the alarm goes off
//! and released again when the alarm is stopped. Both transitions are idempotent, so a
//! repeated or out of order signal never leaks a player or starts a second one.

use std::{fmt, sync::mpsc::Receiver, thread};

use crate::{
    audio::{AudioError, Player},
    communication::{Message, Signal},
};

pub struct TriggerHandler<F, P> {
    open_player: F,
    player: Option<P>,
}

impl<F, P> fmt::Debug for TriggerHandler<F, P>
where
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHandler")
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

impl<F, P> TriggerHandler<F, P>
where
    F: FnMut() -> Result<P, AudioError>,
    P: Player,
{
    /// `open_player` is only called once a player is actually needed
    pub fn new(open_player: F) -> Self {
        Self {
            open_player,
            player: None,
        }
    }

    pub fn handle(&mut self, signal: Signal) -> Result<(), AudioError> {
        match signal {
            Signal::Start => self.start(),
            Signal::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(Player::is_playing)
    }

    fn start(&mut self) -> Result<(), AudioError> {
        if self.player.is_none() {
            self.player = Some((self.open_player)()?);
        }
        let Some(player) = self.player.as_mut() else {
            return Ok(());
        };
        if player.is_playing() {
            log::debug!("alarm already ringing");
        } else {
            player.play();
            log::info!("alarm started ringing");
        }
        Ok(())
    }

    fn stop(&mut self) {
        let Some(mut player) = self.player.take() else {
            log::debug!("stop with no alarm ringing");
            return;
        };
        if player.is_playing() {
            log::debug!("was ringing, stopping the player");
            player.stop();
        }
        player.release();
        log::info!("alarm stopped");
    }
}

/// Runs a [`TriggerHandler`] on its own thread until every sender of `messages` is gone.
///
/// The player is opened on the handler thread, so it does not have to be `Send`.
pub fn spawn_trigger_handler<F, P>(
    messages: Receiver<Message>,
    open_player: F,
) -> std::io::Result<thread::JoinHandle<()>>
where
    F: FnMut() -> Result<P, AudioError> + Send + 'static,
    P: Player,
{
    thread::Builder::new()
        .name("alarm-trigger".to_string())
        .spawn(move || {
            let mut handler = TriggerHandler::new(open_player);
            for message in messages {
                log::debug!("received {} for alarm {}", message.kind, message.alarm_id);
                if let Err(e) = handler.handle(message.kind) {
                    log::error!("couldn't handle {}: {e}", message.kind);
                }
            }
            handler.stop();
        })
}
