use admin_flag::settings::*;

fn main() -> anyhow::Result<()> {
    // $ DB_USER=app REDIS_PORTS=7000,7001 cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:#?}", project_settings);

    match project_settings.validate() {
        Ok(()) => println!("Settings are usable"),
        Err(e) => println!("Settings rejected: {e}"),
    }

    // An explicit path that does not exist is an error.
    let is_err = parse_settings(Some("settings/missing.toml")).is_err();
    println!("Error on missing path: {:?}", is_err);

    Ok(())
}
