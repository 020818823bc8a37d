extern crate time;

use std::process::Command;

fn main() {
    write_git_rev();
    write_compile_date();
}

/// Export the current git hash as MARIONETTE_BUILD_COMMIT_HASH so it's
/// available to version.rs
fn write_git_rev() {
    let commit_hash = Command::new("git")
        .args(&["rev-parse", "--short", "HEAD"])
        .output();
    let changes_in_working_dir = Command::new("git")
        .args(&["status", "--porcelain"])
        .output();

    let (commit_hash, changes) = match (commit_hash, changes_in_working_dir) {
        (Ok(a), Ok(b)) if a.status.success() && b.status.success() => (a, b),
        // Not a checkout, or no git. version.rs copes with the variable
        // being absent.
        _ => return,
    };

    let hash = String::from_utf8_lossy(&commit_hash.stdout).trim().to_string();
    if hash.is_empty() {
        return;
    }
    let wip = !changes.stdout.is_empty();

    println!(
        "cargo:rustc-env=MARIONETTE_BUILD_COMMIT_HASH={}{}",
        if wip { "WIP " } else { "" },
        hash,
    );
}

fn write_compile_date() {
    let now = time::now_utc();
    if let Ok(date) = time::strftime("%Y-%m-%d", &now) {
        println!("cargo:rustc-env=MARIONETTE_BUILD_COMPILE_DATE={}", date);
    }
}
