use std::fs;
use std::path::Path;

use anyhow::Context;
use booking_core::BookingConfig;

/// Reads the TOML config when a path is given, then applies `BOOKING_*`
/// environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BookingConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Cannot read config file {path:?}"))?;
            parse_config(&raw).with_context(|| format!("Invalid config file {path:?}"))?
        }
        None => BookingConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn parse_config(raw: &str) -> anyhow::Result<BookingConfig> {
    Ok(toml::from_str(raw)?)
}

fn apply_env_overrides(
    config: &mut BookingConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(value) = lookup("BOOKING_REPLY_DELAY_MS") {
        config.reply_delay_ms = value
            .trim()
            .parse()
            .with_context(|| format!("BOOKING_REPLY_DELAY_MS is not a number: {value}"))?;
    }
    if let Some(value) = lookup("BOOKING_VISIBLE_SLOTS") {
        config.visible_slots = value
            .trim()
            .parse()
            .with_context(|| format!("BOOKING_VISIBLE_SLOTS is not a number: {value}"))?;
    }
    Ok(())
}
