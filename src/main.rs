use std::{error::Error, path::PathBuf};

use chime_clock::{
    audio::{self, Player},
    chime::ToneRequest,
    config::Config,
    synth::SAMPLE_RATE,
    Clock,
};
use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the one in the platform config directory
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}
#[derive(Subcommand)]
enum Command {
    /// Write the default config
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// Play one chime with the configured sound and exit
    Chime {
        /// play the short test tone instead of a full alert
        #[clap(long, short)]
        test: bool,
    },
    /// Print where the config file lives
    Path,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("chime_clock")
        .map_err(|e| format!("couldn't initialize logger: {e}"))?;

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                println!("wrote default config to {}", config_path.display());
            } else {
                println!(
                    "{} already exists, pass --force to overwrite it",
                    config_path.display()
                );
            }
            return Ok(());
        }
        Some(Command::Chime { test }) => {
            let config = Config::load(&config_path);
            let mut rng = rand::thread_rng();
            let request = if test {
                ToneRequest::for_test(&config.sound, &mut rng)
            } else {
                ToneRequest::for_alert(&config.sound, &config.alarm, &mut rng)
            };
            audio::play_blocking(request.render(SAMPLE_RATE)?, SAMPLE_RATE)?;
            return Ok(());
        }
        Some(Command::Path) => {
            println!("{}", config_path.display());
            return Ok(());
        }
        None => {}
    }

    let config = Config::load(&config_path);
    let [width, height] = config.clock.size;
    let [x, y] = config.clock.position;
    // frameless, transparent and always on top
    #[allow(clippy::cast_precision_loss)]
    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Chime Clock")
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top()
            .with_inner_size([width as f32, height as f32])
            .with_position([x as f32, y as f32]),
        ..Default::default()
    };
    let player = Player::spawn();
    info!(
        "starting overlay, chimes {}",
        if config.alarm.enabled { "on" } else { "off" }
    );

    // run the gui
    run_native(
        "Chime Clock",
        native_options,
        Box::new(|_| Ok(Box::new(Clock::new(config, config_path, player)))),
    )
    .map_err(std::convert::Into::into)
}
