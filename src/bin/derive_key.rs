use admin_flag::domain_model::*;
use admin_flag::settings::*;

/// Prints the cache key the updater would delete for an identifier.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    settings: Option<String>,

    identifier: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let project_settings = parse_settings(args.settings.as_deref())?;
    let secret = project_settings.session_secret()?;

    let identifier = Identifier::parse(&args.identifier)
        .ok_or_else(|| anyhow::anyhow!("identifier cannot be empty"))?;
    println!("{}", derive_session_key(&secret, &identifier));

    Ok(())
}
