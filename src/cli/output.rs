//! CLI output formatting utilities

use colored::Colorize;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// One line of the doctor report
pub fn check(name: &str, outcome: &Result<String, String>) {
    match outcome {
        Ok(detail) => println!("  {} {:<10} {}", "●".green(), name.bold(), detail),
        Err(reason) => println!("  {} {:<10} {}", "○".red(), name.bold(), reason.red()),
    }
}
