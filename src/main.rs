#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod command;
pub mod config;
pub mod controller;
pub mod declare;
pub mod display;
pub mod error;
pub mod feed;
pub mod logging;
pub mod market;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod surface;
pub mod util;

use std::{env, str::FromStr, sync::Arc};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    command::Command, config::SETTINGS, controller::RefreshController, scheduler::Scheduler,
    surface::ConsoleSurface,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        logging::error_console("A rustls crypto provider was already installed".to_string());
    }

    let controller = Arc::new(RefreshController::from_settings(
        &SETTINGS,
        Box::new(ConsoleSurface),
    ));
    let mut scheduler = Scheduler::new().await?;
    scheduler.start(Arc::clone(&controller), &SETTINGS).await?;

    logging::info_console(format!(
        "FuelWatch 已啟動 OS/Arch: {}/{} feed: {}",
        env::consts::OS,
        env::consts::ARCH,
        SETTINGS.feed.url
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match Command::from_str(&line) {
                    Ok(cmd) => {
                        if !command::execute(&controller, cmd).await {
                            break;
                        }
                    }
                    Err(why) => logging::error_console(why.to_string()),
                },
                // stdin 關閉後只等待 ctrl-c
                Ok(None) => stdin_open = false,
                Err(why) => {
                    logging::error_console(format!("Failed to read stdin because {:?}", why));
                    stdin_open = false;
                }
            },
        }
    }

    scheduler.shutdown().await?;
    logging::info_console("FuelWatch 已結束".to_string());

    Ok(())
}
