//! Display utilities for the CLI

use colored::*;

use agentseal_types::{AnchorStatus, ExchangeStatus, VerificationResult};

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", "━".repeat(60).bright_black());
    println!(" {}", title.bright_white().bold());
    println!("{}", "━".repeat(60).bright_black());
}

/// Print a success message
pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    println!("  {} {}", "✗".bright_red(), message.bright_red());
}

/// Print an info message
pub fn info(message: &str) {
    println!("  {} {}", "→".bright_blue(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message.yellow());
}

/// Print a labeled value
pub fn labeled(label: &str, value: &str) {
    println!("  {}: {}", label.bright_white(), value.bright_cyan());
}

/// Print accepted records, trust issues and any verification error
pub fn verification(result: &VerificationResult) {
    for record in &result.records {
        success(&format!("{} signed: {}", record.agent, record.response));
    }
    for issue in &result.trust_issues {
        error(&issue.to_string());
    }
    if let Some(e) = &result.error {
        warning(e);
    }
}

/// Print the anchoring outcome
pub fn anchoring(status: &AnchorStatus) {
    match status {
        AnchorStatus::Anchored(receipt) => {
            success("Outcome anchored");
            labeled("Receipt", &receipt.id);
            labeled("Signature", &receipt.signature);
        }
        AnchorStatus::Failed { message } => warning(&format!("Anchoring failed: {}", message)),
        AnchorStatus::Skipped => info("Anchoring skipped (no token)"),
    }
}

pub fn status(status: &ExchangeStatus) {
    let message = status.user_message();
    match status {
        ExchangeStatus::Verified => println!("\n  {}", message.bright_green().bold()),
        ExchangeStatus::TrustIssues(_) => println!("\n  {}", message.bright_red().bold()),
        ExchangeStatus::Error(_) => println!("\n  {}", message.yellow().bold()),
    }
}
