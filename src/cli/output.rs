//! Colored terminal output helpers.

use owo_colors::OwoColorize;
use std::io::{self, Write};

pub struct Output;

impl Output {
    pub fn banner(name: &str, version: &str) {
        println!();
        println!("  {} {}", name.bold().cyan(), version.dimmed());
        println!("  {}", "retrieval-augmented question answering".dimmed());
        println!();
    }

    pub fn success(msg: &str) {
        println!("{} {}", "✓".green().bold(), msg);
    }

    pub fn info(msg: &str) {
        println!("{} {}", "·".blue(), msg);
    }

    pub fn warning(msg: &str) {
        println!("{} {}", "!".yellow().bold(), msg.yellow());
    }

    pub fn error(msg: &str) {
        eprintln!("{} {}", "✗".red().bold(), msg.red());
    }

    /// Prompt prefix for user input; flushes so the cursor sits after it.
    pub fn prompt() -> io::Result<()> {
        print!("{} ", "you ›".bold().green());
        io::stdout().flush()
    }

    pub fn thinking() -> io::Result<()> {
        print!("{}", "thinking…".dimmed());
        io::stdout().flush()
    }

    /// Erase the thinking indicator before printing the answer.
    pub fn clear_line() -> io::Result<()> {
        print!("\r\x1b[2K");
        io::stdout().flush()
    }

    pub fn answer(msg: &str) {
        println!("{} {}", "bot ›".bold().cyan(), msg);
        println!();
    }
}
