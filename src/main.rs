use clap::Parser;
use admin_console::cli::commands::{cmd_form, cmd_login, cmd_logout, cmd_routes, cmd_tabs};
use admin_console::cli::config::{Cli, Commands, apply_overrides, load_config};
use tracing_subscriber::filter::LevelFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Resolve settings: CLI > config file > defaults
    let config = apply_overrides(load_config(cli.config.as_deref()), &cli);

    match &cli.command {
        Commands::Routes { menu, rows, mode } => {
            cmd_routes(&config, menu.as_deref(), *rows, mode.as_deref())?;
        }
        Commands::Form {
            schema,
            values,
            width,
            toggle,
            submit,
        } => {
            cmd_form(schema, values.as_deref(), *width, *toggle, *submit)?;
        }
        Commands::Login {
            username,
            password,
            redirect,
        } => {
            cmd_login(&config, username, password, redirect.as_deref())?;
        }
        Commands::Logout => cmd_logout(&config)?,
        Commands::Tabs => cmd_tabs(&config)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
