// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=MINI_GALLERY_VERSION");

    // Packagers can pin the version string
    let version = match std::env::var("MINI_GALLERY_VERSION") {
        Ok(v) if !v.is_empty() => v,
        _ => describe_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Build a version string from `git describe`.
///
/// - exact tag `v0.1.0` becomes `0.1.0-abcdef1`
/// - `v0.1.0-5-gabcdef1` becomes `0.1.0-dirty-abcdef1`
/// - outside a git checkout the crate version is used
fn describe_version() -> String {
    let crate_version = env!("CARGO_PKG_VERSION").to_string();

    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return crate_version;
    };
    let described = described.strip_prefix('v').unwrap_or(&described).to_string();
    let commit_hash = git(&["rev-parse", "--short", "HEAD"]);

    if described.contains('-') {
        let parts: Vec<&str> = described.rsplitn(3, '-').collect();
        if parts.len() >= 3 {
            let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
            return format!("{}-dirty-{}", parts[2], hash);
        }
        return described;
    }

    match commit_hash {
        // `--always` falls back to a bare hash when there are no tags
        Some(hash) if hash == described => format!("{}-{}", crate_version, hash),
        Some(hash) => format!("{}-{}", described, hash),
        None => described,
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if output.status.success() {
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!text.is_empty()).then_some(text)
    } else {
        None
    }
}
