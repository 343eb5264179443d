use anyhow::Context;
use log::info;
use smoothdrive::config::Config;
use smoothdrive::gear_profiles::GearProfiles;
use smoothdrive::{bridge, Driver};

fn main() -> anyhow::Result<()> {
    shared::init_logging();
    info!("SmoothDrive {}", shared::VERSION_STR);

    let config = Config::load(std::path::Path::new("./config.json"));
    let profiles = GearProfiles::load(&config.gearbox_profile_directory);
    info!(
        "{} gearbox profiles from {}",
        profiles.len(),
        config.gearbox_profile_directory.display()
    );

    let mut driver = Driver::new(config, profiles);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let ticks = bridge::serve(&mut driver, &mut stdin.lock(), &mut stdout.lock())
        .context("Frame stream failed")?;
    info!("Host closed the stream after {} ticks", ticks);
    Ok(())
}
