// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

pub fn build() -> Result<()> {
    print_task_start("Building All Crates", HAMMER, BLUE);
    print_info("Compiling all workspace crates in debug mode");
    execute_command("cargo", &["build", "--workspace", "--exclude", "xtask"], "Build")
}

pub fn test() -> Result<()> {
    print_task_start("Running All Tests", TEST_TUBE, GREEN);
    print_info("Running unit tests, integration tests and doc tests");
    execute_command("cargo", &["test", "--workspace"], "Tests")
}

pub fn check() -> Result<()> {
    print_task_start("Checking All Crates", MAGNIFIER, CYAN);
    print_info("Checking code for errors without building executables");
    execute_command("cargo", &["check", "--workspace", "--all-targets"], "Check")
}

pub fn format(check_only: bool) -> Result<()> {
    print_task_start("Formatting Code", BRUSH, MAGENTA);
    // `fmt` takes `--all`, not `--workspace`.
    if check_only {
        print_info("Verifying formatting without rewriting files");
        execute_command("cargo", &["fmt", "--all", "--", "--check"], "Format check")
    } else {
        print_info("Formatting code using rustfmt with default settings");
        execute_command("cargo", &["fmt", "--all"], "Format")
    }
}

pub fn clippy() -> Result<()> {
    print_task_start("Running Clippy", CLIPPY, YELLOW);
    print_info("Running Clippy linter with warnings as errors");
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        "Clippy",
    )
}

/// Runs every CI step, continuing past failures, and reports a summary.
pub fn all() -> Result<()> {
    println!("{BANNER}");
    println!("{BOLD}💡 Pipeline:{RESET} build → test → check → format → clippy");

    let start_time = Instant::now();
    let tasks: [(&str, fn() -> Result<()>); 5] = [
        ("Build Phase", build),
        ("Test Phase", test),
        ("Check Phase", check),
        ("Format Phase", || format(true)),
        ("Clippy Phase", clippy),
    ];
    let total = tasks.len();
    let mut failed = Vec::new();

    for (i, (name, task)) in tasks.iter().enumerate() {
        println!("\n{BOLD}{BLUE}[{}/{}] {}{RESET}", i + 1, total, name);
        if let Err(err) = task() {
            log::warn!("xtask: {} failed: {}", name, err);
            failed.push(*name);
        }
    }

    let seconds = start_time.elapsed().as_secs_f64();
    if failed.is_empty() {
        print_success(&format!("All {total} tasks completed in {seconds:.2}s"));
        Ok(())
    } else {
        print_error(&format!(
            "{}/{} tasks completed in {seconds:.2}s",
            total - failed.len(),
            total
        ));
        anyhow::bail!("Pipeline failed: {}", failed.join(", "))
    }
}
