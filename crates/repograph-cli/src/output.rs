//! Terminal output formatting.

use colored::Colorize;

use repograph_graph::{GraphCounts, GraphHealth, ReconcileReport};

/// Print a reconciliation report.
pub fn print_reconcile_report(report: &ReconcileReport) {
    println!();
    println!("{}: {}", "Examined".bold(), report.examined);

    if report.processed.is_empty() {
        println!("{}", "No missing revisions.".dimmed());
    } else {
        println!("{}", "Processed".green().bold());
        for revision in &report.processed {
            println!("  {} {}", "+".green(), short(revision));
        }
    }

    if !report.skipped.is_empty() {
        println!("{}: {}", "Already in graph".bold(), report.skipped.len().to_string().dimmed());
    }

    if !report.failed.is_empty() {
        println!("{}", "Failed".red().bold());
        for (revision, reason) in &report.failed {
            println!("  {} {} {}", "x".red(), short(revision), reason.dimmed());
        }
    }

    let totals = &report.totals;
    println!();
    println!("  Nodes created:         {}", totals.nodes_created);
    println!("  Nodes updated:         {}", totals.nodes_updated);
    println!("  Relationships created: {}", totals.relationships_created);
    if totals.relationships_skipped > 0 {
        println!("  Relationships skipped: {}", totals.relationships_skipped.to_string().yellow());
    }
}

/// Print graph health and counts.
pub fn print_status(uri: &str, health: &GraphHealth, counts: &GraphCounts) {
    println!("{}", "Graph Status".bold());
    println!("{}", "─".repeat(40));
    println!("  Neo4j:          {}", uri.cyan());
    println!("  Active nodes:   {}", health.active_nodes.to_string().green());
    println!("  Nodes:          {}", counts.nodes);
    println!("  Relationships:  {}", counts.relationships);
    println!(
        "  Last commit:    {}",
        health.last_commit.as_deref().map(short).unwrap_or("never").yellow()
    );
    println!(
        "  Last updated:   {}",
        health.last_updated.as_deref().unwrap_or("never").dimmed()
    );
}

/// Abbreviate a revision hash for display.
fn short(revision: &str) -> &str {
    match revision.char_indices().nth(12) {
        Some((idx, _)) => &revision[..idx],
        None => revision,
    }
}
