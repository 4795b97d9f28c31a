use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/heads");

    let hash = git(&["rev-parse", "--short=8", "HEAD"])
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let dirty = git(&["status", "--porcelain"]).is_some_and(|s| !s.is_empty());

    // Shown by `ado --version`
    println!(
        "cargo::rustc-env=GIT_HASH={hash}{}",
        if dirty { "-dirty" } else { "" }
    );
}
