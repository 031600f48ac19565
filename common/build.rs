// Build version is the crate version followed by the short commit hash,
// exposed to the crate as the BUILD_VERSION environment variable.

use std::process::Command;

fn main() {
    let commit_hash = match option_env!("HARVEST_COMMIT_HASH") {
        Some(hash) => hash.chars().take(7).collect(),
        None => Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
            .ok()
            .filter(|output| output.status.success())
            .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    };

    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), commit_hash);
    println!("cargo:rerun-if-env-changed=HARVEST_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
