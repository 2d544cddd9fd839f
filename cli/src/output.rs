//! Terminal formatting. Data goes to stdout, diagnostics to stderr.

use colored::Colorize;

pub fn header(title: &str) {
    println!("{}", title.bold().underline());
}

pub fn hint(msg: &str) {
    println!("{} {}", "hint:".cyan().bold(), msg.dimmed());
}

pub fn info(msg: &str) {
    eprintln!("{} {}", "info:".blue().bold(), msg);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Heading for one change event: the layer location and its format tag.
pub fn change_source(location: &str, tag: &str) {
    println!("{} {}", location.bold(), format!("({})", tag).dimmed());
}

pub fn added(key: &str, value: &str) {
    println!("  {} {} = {}", "+".green().bold(), key, value);
}

pub fn modified(key: &str, old: &str, new: &str) {
    println!(
        "  {} {} = {} {} {}",
        "~".yellow().bold(),
        key,
        old.dimmed(),
        "->".dimmed(),
        new
    );
}

pub fn removed(key: &str) {
    println!("  {} {}", "-".red().bold(), key.strikethrough());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_lines_do_not_panic() {
        change_source("/etc/app.json", "json");
        added("Server:Port", "5000");
        modified("Server:Port", "5000", "6000");
        removed("Server:Host");
    }

    #[test]
    fn test_status_lines_do_not_panic() {
        header("Layers");
        hint("pass --file");
        info("watching");
        warn("missed 2 event(s)");
        error("reload failed");
        success("all keys present");
    }
}
