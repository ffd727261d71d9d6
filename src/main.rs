//! Artdeck - operator console for render-automation workspaces
//!
//! This is the binary entry point. All logic lives in the libraries.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use artdeck::cli::{Args, Command, Mode};
use artdeck::{launcher, users, LaunchOutcome};
use artdeck_app::config::load_settings;
use artdeck_core::logging;
use artdeck_daemon::{FsWorkspace, ServerArgs};
use artdeck_web::WebArgs;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Some(Command::Serve {
        path,
        timeout,
        launch,
        no_ssl,
    }) = &args.command
    {
        logging::init("web")?;
        artdeck_web::serve(WebArgs {
            workspace: path.clone(),
            timeout: Duration::from_secs(*timeout),
            launch_file: launch.clone(),
            no_ssl: *no_ssl,
        })
        .await?;
        return Ok(());
    }

    let workspace = match launcher::resolve_workspace(args.path.as_deref()) {
        Ok(workspace) => workspace,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    match args.mode() {
        Mode::AddUser { name, admin } => {
            users::add_user_from_console(&workspace, &name, admin)?;
            println!("User '{}' added", name);
        }
        Mode::Console => {
            logging::init("console")?;
            let settings = load_settings(&workspace);
            let fs = FsWorkspace::open(&workspace)?.with_launch_file(args.launch.clone());
            artdeck_tui::run(Arc::new(fs), settings).await?;
        }
        Mode::WebServer => {
            logging::init("gui")?;
            let server = ServerArgs {
                workspace,
                timeout_secs: args.timeout,
                launch_file: args.launch.clone(),
                no_ssl: args.no_ssl,
            };
            match launcher::run_web_server(&server).await? {
                LaunchOutcome::AlreadyRunning => {
                    println!("GUI web server already running for this workspace");
                    std::process::exit(1);
                }
                LaunchOutcome::Closed { .. } => println!("GUI web server closed down"),
            }
        }
        // handled before resolving the workspace
        Mode::Serve => {}
    }
    Ok(())
}
