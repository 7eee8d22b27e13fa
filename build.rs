//! Embeds the build version as `HOMEMAKER_VERSION`.
use std::process::Command;

fn main() {
    // Release builds pass HOMEMAKER_VERSION explicitly; local builds ask git.
    if let Ok(version) = std::env::var("HOMEMAKER_VERSION") {
        println!("cargo:rustc-env=HOMEMAKER_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=HOMEMAKER_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=HOMEMAKER_VERSION");
}
