use anyhow::{Context, Result};
use inquire::{Confirm, Password, PasswordDisplayMode, Text, validator::Validation};
use weather_core::{CityName, ProviderId};

/// Ask whether to append one more city to `cities`.
pub fn offer_extra_city(cities: &mut Vec<CityName>) -> Result<()> {
    let listed = cities.iter().map(CityName::as_str).collect::<Vec<_>>().join(", ");

    let add = Confirm::new("Would you like to add another city to the list?")
        .with_help_message(&format!("Current list: {listed}"))
        .with_default(false)
        .prompt()
        .context("Failed to read answer")?;

    if !add {
        return Ok(());
    }

    let name = Text::new("Enter city name:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Ok(Validation::Invalid("City name must not be empty".into()))
            } else {
                Ok(Validation::Valid)
            }
        })
        .prompt()
        .context("Failed to read city name")?;

    cities.push(CityName::new(name)?);
    Ok(())
}

pub fn api_key(provider: ProviderId) -> Result<String> {
    let key = Password::new(&format!("API key for {provider}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let key = key.trim().to_string();
    if key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    Ok(key)
}

pub fn make_default(provider: ProviderId) -> Result<bool> {
    Confirm::new(&format!("Use {provider} as the default provider?"))
        .with_default(true)
        .prompt()
        .context("Failed to read answer")
}
