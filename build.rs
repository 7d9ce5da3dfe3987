use std::process::Command;

fn main() {
    println!("cargo:rustc-env=BUILD_DATE={}", build_date());
    println!("cargo:rustc-env=GIT_COMMIT={}", git_commit());
    println!("cargo:rerun-if-changed=.git/HEAD");
}

/// Short hash of the checked-out commit, or "unknown" outside a git tree.
fn git_commit() -> String {
    command_output("git", &["rev-parse", "--short", "HEAD"])
}

/// UTC build date without pulling in a date crate.
fn build_date() -> String {
    command_output("date", &["-u", "+%Y-%m-%d"])
}

fn command_output(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
