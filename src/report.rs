//! Colored console reporting

use colored::Colorize;

/// Informational progress line
pub fn info(msg: impl AsRef<str>) {
    println!("{} {}", format!("[{}]", crate::APP_NAME).cyan(), msg.as_ref());
}

/// Non-fatal problem; the pipeline continues
pub fn warn(msg: impl AsRef<str>) {
    eprintln!(
        "{} {} {}",
        format!("[{}]", crate::APP_NAME).cyan(),
        "warning:".yellow().bold(),
        msg.as_ref()
    );
}

/// Fatal problem; the caller exits after printing this
pub fn error(msg: impl AsRef<str>) {
    eprintln!(
        "{} {} {}",
        format!("[{}]", crate::APP_NAME).cyan(),
        "error:".red().bold(),
        msg.as_ref()
    );
}
