//! Console summary of a run

use crate::crawler::CrawlOutcome;
use crate::output::report::RunReport;

/// Prints the run report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report of the finished run
pub fn print_summary(report: &RunReport) {
    println!("=== Sweep Summary ===\n");

    println!("Overview:");
    for url in &report.start_urls {
        println!("  Start URL: {}", url);
    }
    println!("  Outcome: {}", outcome_label(report.outcome));
    println!("  Duration: {} seconds", report.duration_seconds());
    if let Some(hash) = &report.plan_hash {
        println!("  Plan hash: {}", hash);
    }
    println!();

    println!("Pages:");
    println!("  Crawled: {}", report.pages_crawled);
    println!("  Failed: {}", report.pages_failed);
    println!("  Discovered: {}", report.pages_discovered);
    println!("  Seeds for downstream: {}", report.seeds_for_downstream);
    println!();

    if report.limits.structure {
        println!("Products:");
        println!(
            "  Fetched: {} (cap {}, {} per category)",
            report.products_fetched,
            report.limits.global_product_cap,
            report.limits.products_per_category
        );
        println!("  Discarded by quota: {}", report.products_discarded);
        println!();
    }

    let succeeded = report.pages_crawled - report.pages_failed;
    let success_rate = if report.pages_crawled > 0 {
        (succeeded as f64 / report.pages_crawled as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully fetched)",
        success_rate, succeeded, report.pages_crawled
    );
}

fn outcome_label(outcome: CrawlOutcome) -> &'static str {
    match outcome {
        CrawlOutcome::Done => "done",
        CrawlOutcome::Stopped => "stopped early (resume with --resume)",
        CrawlOutcome::Exhausted => "exhausted (no pages fetched)",
    }
}
