#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, Local, Utc};
use clock::Clock;
use config::Config;
use countdown::{CountdownTicker, Remaining};
use eframe::egui::{self, Button, CentralPanel, Layout, Slider, TopBottomPanel, Window};
use platform::TimerThread;
use scheduler::Scheduler;
use selector::WindowHours;

pub mod audio;
pub mod clock;
pub mod communication;
pub mod config;
pub mod countdown;
pub mod platform;
pub mod scheduler;
pub mod selector;
pub mod trigger;
/// egui widgets
pub mod widgets;

use audio::SoundSettings;
use widgets::HourDial;

const TICK: Duration = Duration::from_secs(1);

/// the one window of the app
pub struct RandomAlarm {
    config: Config,
    config_path: PathBuf,
    sound: Arc<Mutex<SoundSettings>>,
    hours: WindowHours,
    scheduler: Scheduler<TimerThread>,
    clock: Arc<dyn Clock>,
    countdown: Option<CountdownTicker>,
    in_settings: bool,
}

impl RandomAlarm {
    /// `sound` is the same handle the trigger handler opens players from
    #[must_use]
    pub fn new(
        config: Config,
        config_path: PathBuf,
        sound: Arc<Mutex<SoundSettings>>,
        hours: WindowHours,
        scheduler: Scheduler<TimerThread>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            config_path,
            sound,
            hours,
            scheduler,
            clock,
            countdown: None,
            in_settings: false,
        }
    }

    fn is_active(&self) -> bool {
        self.scheduler.fire_at().is_some()
    }

    fn toggle_alarm(&mut self, ctx: &egui::Context) {
        if self.is_active() {
            self.dismiss();
        } else {
            let fire_at = self.scheduler.activate(self.hours);
            self.start_countdown(fire_at, ctx);
        }
    }

    // cancel and stop both end here, the alarm may already be ringing
    fn dismiss(&mut self) {
        self.scheduler.dismiss();
        self.countdown = None;
    }

    fn start_countdown(&mut self, target: DateTime<Utc>, ctx: &egui::Context) {
        // the old ticker has to go before the new one starts
        self.countdown = None;
        let ctx = ctx.clone();
        match CountdownTicker::spawn(target, Arc::clone(&self.clock), TICK, move || {
            ctx.request_repaint();
        }) {
            Ok(ticker) => self.countdown = Some(ticker),
            Err(e) => log::error!("couldn't start countdown: {e}"),
        }
    }

    fn save(&self) {
        if let Err(e) = self.config.save(&self.config_path) {
            log::error!("couldn't save config: {e}");
        }
    }

    fn sync_sound(&self) {
        let mut sound = self.sound.lock().unwrap_or_else(PoisonError::into_inner);
        *sound = SoundSettings::from(&self.config);
    }

    fn render_settings(&mut self, ctx: &egui::Context) {
        let mut open = self.in_settings;
        let mut changed = false;
        Window::new("settings ⚙").open(&mut open).show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("alarm sound: {}", self.config.alarm_sound()));
                if ui.button("choose…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("audio", &["mp3", "wav", "ogg", "flac"])
                        .pick_file()
                    {
                        self.config.sound = Some(path);
                        changed = true;
                    }
                }
                if self.config.sound.is_some() && ui.button("use beep").clicked() {
                    self.config.sound = None;
                    changed = true;
                }
            });
            changed |= ui
                .add(
                    Slider::new(&mut self.config.volume, 0.0..=100.0)
                        .integer()
                        .suffix("%")
                        .text("volume"),
                )
                .changed();
            ui.horizontal(|ui| {
                ui.label("start with");
                let mut default_hours = self.config.default_hours;
                if ui.small_button("-").clicked() {
                    changed |= default_hours.decrement();
                }
                ui.label(default_hours.to_string());
                if ui.small_button("+").clicked() {
                    changed |= default_hours.increment();
                }
                self.config.default_hours = default_hours;
            });
        });
        self.in_settings = open;
        if changed {
            self.sync_sound();
            self.save();
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("time_and_ctrl").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let theme_btn = ui.add(Button::new(if self.config.theme == config::Theme::Dark {
                    "🌞"
                } else {
                    "🌙"
                }));
                if theme_btn.clicked() {
                    self.config.theme = !self.config.theme;
                    self.save();
                }
                ui.label(format!("Time: {}", Local::now().format("%H:%M:%S")));
                ui.with_layout(Layout::right_to_left(egui::Align::Min), |ui| {
                    if ui.button("⚙").on_hover_text("settings").clicked() {
                        self.in_settings = true;
                    }
                });
            });
        });
    }

    fn render_selector(&mut self, ui: &mut egui::Ui) {
        let active = self.is_active();
        ui.horizontal(|ui| {
            if ui.add_enabled(!active, Button::new("-")).clicked() {
                self.hours.decrement();
            }
            ui.label(format!("Time until alarm: {}", self.hours));
            if ui.add_enabled(!active, Button::new("+")).clicked() {
                self.hours.increment();
            }
        });
        ui.add_enabled(!active, HourDial::new(&mut self.hours));
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        let label = if self.is_active() {
            "Cancel Alarm"
        } else {
            "Set Random Alarm"
        };
        if ui.button(label).clicked() {
            self.toggle_alarm(ui.ctx());
        }

        if let Some(countdown) = &mut self.countdown {
            let remaining = countdown.latest();
            ui.label(format!("Time left until alarm: {remaining}"));
            if let Some(note) = countdown_note(remaining) {
                ui.label(note);
            }
        }

        if self.is_active() && ui.button("Stop Alarm").clicked() {
            self.dismiss();
        }
    }
}

// only the time is known here, whether a player actually opened is up to the trigger thread
fn countdown_note(remaining: Remaining) -> Option<&'static str> {
    remaining.is_zero().then_some("⏰ alarm time reached")
}

impl eframe::App for RandomAlarm {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.config.theme.into());
        if self.in_settings {
            self.render_settings(ctx);
        }
        self.render_header(ctx);
        CentralPanel::default().show(ctx, |ui| {
            self.render_selector(ui);
            ui.separator();
            self.render_controls(ui);
        });
        // keeps the header clock moving
        ctx.request_repaint_after(TICK);
    }
}
