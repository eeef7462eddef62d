//! Headless WebX browser.
//!
//! Usage: `webx <address> [config.toml]`
//!
//! Loads configuration (argument, `WEBX_CONFIG`, or `webx.toml`), navigates
//! to the address with the built-in collaborators, waits for every script
//! to finish, then prints the log panel and the rendered document.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};

use webx_browser::{Browser, LogLevel, headless};
use webx_net::{HttpLimits, HttpTransport, RustlsTlsProvider, Transport};
use webx_types::BrowserConfig;

const DEFAULT_CONFIG: &str = "webx.toml";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let address = args
        .next()
        .context("usage: webx <address> [config.toml]")?;
    let config_path = args
        .next()
        .or_else(|| std::env::var("WEBX_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = BrowserConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    log::info!(
        "Starting WebX (naming service {}, alternate theme {})",
        config.naming_service,
        config.alternate_theme,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(config, &address))
}

async fn run(config: BrowserConfig, address: &str) -> Result<()> {
    let transport: Rc<dyn Transport> = Rc::new(
        HttpTransport::new(HttpLimits::from_config(&config))
            .with_tls(Arc::new(RustlsTlsProvider::new())),
    );
    let mut browser = Browser::new(
        config,
        transport,
        headless::collaborators(),
        headless::engines(),
    );

    let outcome = browser.navigate(address).await;
    browser.settle().await;

    let panel = browser.log();
    println!("{}", panel.render_html());
    match outcome {
        Ok(report) => {
            println!(
                "{} -> {} ({} styles, {} scripts, {} contexts)",
                address,
                report.target.base,
                report.styles.styles_applied,
                report.scripts_spawned,
                browser.registry_len(),
            );
            println!("{}", browser.surface().read(|s| s.render_document()));
            let errors = panel.count(LogLevel::Error);
            if errors > 0 {
                log::warn!("page loaded with {errors} errors");
            }
            Ok(())
        },
        Err(e) => Err(e).with_context(|| format!("navigating to {address}")),
    }
}
