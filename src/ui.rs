use colored::*;

pub fn print_header(title: &str, detail: &str) {
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", "SolAgent".yellow().bold(), version);
    println!("  {}", format!("{}  •  {}", title, detail).cyan());
    println!();
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "❌".red().bold(), msg.red());
}
