//! Console output utilities.

use console::style;

use crate::watch::WatchSummary;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Downloads Monitor                                 ║
║     Duplicate e-book remover                          ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(watch_dir: &str, store: &str, workers: usize) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Directory: {}", watch_dir);
    println!("  Store:     {}", store);
    println!("  Workers:   {}", workers);
    println!();
}

/// Print the shutdown line.
pub fn print_shutdown(summary: &WatchSummary) {
    println!(
        "Stopped: {} registered, {} removed ({} skipped)",
        style(summary.registered).green(),
        style(summary.removed).yellow(),
        style(summary.skipped).dim()
    );
}
