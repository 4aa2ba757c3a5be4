//! Status command - check engine health and cache volumes

use crate::cache::{ANDROID_BUILD, ANDROID_GRADLE, PUB_CACHE};
use crate::config::ConfigManager;
use crate::engine::{ContainerEngine, PodmanEngine};
use crate::error::TarmacResult;
use console::{style, Emoji};
use std::process::Stdio;
use tokio::process::Command;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");

/// Execute the status command
pub async fn execute() -> TarmacResult<()> {
    println!("{}", style("Tarmac System Status").bold().cyan());
    println!();

    let engine = PodmanEngine::new(false);
    let mut all_ok = true;

    println!("{}", style("Engine:").bold());
    match engine.is_available().await {
        Ok(true) => {
            println!("  {} {} available", CHECK, engine.engine_name());
            if let Some(version) = podman_version().await {
                println!("  {} {}", CHECK, version);
            }
        }
        Ok(false) => {
            println!(
                "  {} {} - install podman and run: podman system migrate",
                CROSS,
                style("Rootless podman not ready").red()
            );
            all_ok = false;
        }
        Err(e) => {
            println!("  {} {}", CROSS, style(e).red());
            all_ok = false;
        }
    }

    println!();
    println!("{}", style("Cache volumes:").bold());
    for name in [PUB_CACHE, ANDROID_GRADLE, ANDROID_BUILD] {
        let volume = crate::cache::volume(name);
        match volume_exists(&volume.volume_name()).await {
            Some(true) => println!("  {} {} ({})", CHECK, name, volume.volume_name()),
            Some(false) => println!("  - {} (created on first use)", name),
            None => println!("  - {} (engine unavailable)", name),
        }
    }

    println!();
    println!("{}", style("State:").bold());
    println!("  contexts: {}", ConfigManager::contexts_dir().display());
    println!("  config:   {}", ConfigManager::default_config_path().display());

    println!();
    if all_ok {
        println!("{}", style("All critical checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details")
                .yellow()
                .bold()
        );
    }

    Ok(())
}

async fn podman_version() -> Option<String> {
    let output = Command::new("podman")
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

async fn volume_exists(name: &str) -> Option<bool> {
    let status = Command::new("podman")
        .args(["volume", "exists", name])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .ok()?;
    Some(status.success())
}
