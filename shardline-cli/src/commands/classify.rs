//! Classify command handler

use anyhow::Result;
use colored::Colorize;
use shardline_router_core::{Classifier, KeywordClassifier};

pub fn handle(sql: &str) -> Result<()> {
    let kind = KeywordClassifier.classify(sql);

    println!("{} {}", "→".cyan().bold(), kind.to_string().cyan());
    println!("  Cacheable read: {}", yes_no(kind.is_cacheable_read()));
    println!("  Write:          {}", yes_no(kind.is_write()));

    Ok(())
}

fn yes_no(flag: bool) -> colored::ColoredString {
    if flag {
        "yes".green()
    } else {
        "no".dimmed()
    }
}
