use std::{
    error::Error,
    path::PathBuf,
    sync::{mpsc, Arc, Mutex, PoisonError},
};

use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use random_alarm::{
    audio::SoundSettings,
    clock::{Clock, SystemClock},
    config::Config,
    platform::TimerThread,
    scheduler::Scheduler,
    selector::WindowHours,
    trigger::spawn_trigger_handler,
    RandomAlarm,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// how many hours ahead the alarm may ring, 1 to 23
    #[clap(long, short = 'H', value_parser = clap::value_parser!(u8).range(1..=23))]
    hours: Option<u8>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// ring with this file instead of the built in beep
    SetSound { path: PathBuf },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("random_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = Config::config_path()?;
    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                log::info!("wrote default config to {}", config_path.display());
            }
            return Ok(());
        }
        Some(Command::SetSound { path }) => {
            let mut config = Config::load_or_default(&config_path)?;
            config.sound = Some(path.canonicalize()?);
            config.save(&config_path)?;
            return Ok(());
        }
        None => {}
    }

    let config = Config::load_or_default(&config_path)?;
    let hours = args.hours.map_or(config.default_hours, WindowHours::new);
    let sound = Arc::new(Mutex::new(SoundSettings::from(&config)));

    // START_ALARM and STOP_ALARM both reach the trigger handler through this channel
    let (tx, rx) = mpsc::channel();
    let player_sound = Arc::clone(&sound);
    spawn_trigger_handler(rx, move || {
        player_sound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .open_player()
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let timer = TimerThread::spawn(Arc::clone(&clock), tx)?;
    let scheduler = Scheduler::new(timer, Arc::clone(&clock));

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([380.0, 320.0])
            .with_title("Random Alarm"),
        ..Default::default()
    };
    // run the gui
    run_native(
        "Random Alarm",
        native_options,
        Box::new(move |_| {
            let app: Box<dyn eframe::App> = Box::new(RandomAlarm::new(
                config,
                config_path,
                sound,
                hours,
                scheduler,
                clock,
            ));
            Ok(app)
        }),
    )
    .map_err(std::convert::Into::into)
}
