//! Styled terminal lines.

use console::style;

/// Whether `NO_COLOR` asks for plain output.
#[must_use]
pub fn is_color_disabled() -> bool {
    std::env::var_os("NO_COLOR").is_some()
}

/// Section header, e.g. the strategy about to run.
pub fn print_header(text: &str) {
    if is_color_disabled() {
        println!("== {text} ==");
    } else {
        println!("{}", style(format!("== {text} ==")).bold().cyan());
    }
}

/// Completed step.
pub fn print_success(text: &str) {
    if is_color_disabled() {
        println!("[done] {text}");
    } else {
        println!("{} {text}", style("[done]").green().bold());
    }
}

/// Non-fatal problem, on stderr.
pub fn print_warning(text: &str) {
    if is_color_disabled() {
        eprintln!("[warn] {text}");
    } else {
        eprintln!("{} {text}", style("[warn]").yellow().bold());
    }
}

/// Fatal problem, on stderr.
pub fn print_error(text: &str) {
    if is_color_disabled() {
        eprintln!("[error] {text}");
    } else {
        eprintln!("{} {text}", style("[error]").red().bold());
    }
}
