use std::io;
use std::path::PathBuf;

use anyhow::Context;
use booking_core::{AppointmentStore, BookingSession, Directory, GeoPoint, MemoryStore};
use booking_directory::{JsonFileDirectory, JsonFileStore};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod chat;
mod config;

#[derive(Parser, Debug)]
#[command(
    name = "booking-cli",
    about = "Book a doctor's appointment through the Doc assistant in the terminal."
)]
struct Args {
    /// JSON file with the doctor list.
    #[arg(long)]
    doctors: PathBuf,

    /// JSON file with the hospital list.
    #[arg(long)]
    hospitals: PathBuf,

    /// Append confirmed appointments to this JSON file instead of keeping
    /// them in memory.
    #[arg(long)]
    store: Option<PathBuf>,

    /// TOML file with `reply_delay_ms` and `visible_slots`.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Your latitude, used for distance and travel estimates.
    #[arg(long, allow_hyphen_values = true, requires = "lng")]
    lat: Option<f64>,

    /// Your longitude.
    #[arg(long, allow_hyphen_values = true, requires = "lat")]
    lng: Option<f64>,

    /// Override the assistant's typing delay.
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print the final appointment record as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(delay_ms) = args.delay_ms {
        config.reply_delay_ms = delay_ms;
    }

    let directory = Directory::load(&JsonFileDirectory::new(&args.doctors, &args.hospitals))
        .with_context(|| {
            format!(
                "Cannot load directory from {:?} and {:?}",
                args.doctors, args.hospitals
            )
        })?;
    tracing::info!(
        doctors = directory.doctors.len(),
        hospitals = directory.hospitals.len(),
        "directory loaded"
    );

    let store: Box<dyn AppointmentStore> = match &args.store {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };
    let location = GeoPoint::from_parts(args.lat, args.lng);

    let mut session = BookingSession::new(directory, store, config).with_user_location(location);

    let stdin = io::stdin();
    let stdout = io::stdout();
    chat::run_chat(&mut session, stdin.lock(), stdout.lock(), true)?;

    if args.json {
        if let Some(appointment) = session.appointment() {
            println!("{}", serde_json::to_string_pretty(appointment)?);
        }
    }

    Ok(())
}
