use anyhow::Result;
use daystrip_core::DayStripConfig;
use owo_colors::OwoColorize;

pub fn path() -> Result<()> {
    println!("{}", DayStripConfig::config_path()?.display());
    Ok(())
}

pub fn init() -> Result<()> {
    let config_path = DayStripConfig::config_path()?;

    if config_path.exists() {
        anyhow::bail!("Config already exists at {}", config_path.display());
    }

    DayStripConfig::create_default_config(&config_path)?;

    println!("{} {}", "Created".green(), config_path.display());
    println!(
        "{}",
        "Add your feeds under [[ical_sources]] and run `daystrip show`.".dimmed()
    );
    Ok(())
}
