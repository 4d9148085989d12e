// RustOnAirDesklight - Build Script
//
// Exports the ESP-IDF link environment and the firmware version string.

use std::process::Command;

fn main() {
    // ESP-IDF environment setup (MUST be first!), only meaningful on device builds
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    // Get git version info
    let version = env!("CARGO_PKG_VERSION");
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=VERSION_STRING=OnAirDesklight v{}-g{}", version, git_hash);

    // Rebuild when the onboard tune changes
    println!("cargo:rerun-if-changed=assets/onair.bin");

    // Rebuild if git HEAD changes
    println!("cargo:rerun-if-changed=.git/HEAD");
}
