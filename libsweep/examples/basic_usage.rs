//! Basic usage example for the Sweep library.
//!
//! Lists what a retention policy would delete from a local registry without
//! deleting anything.
//!
//! Run with: cargo run --example basic_usage -- localhost:5000/team/app

use chrono::{Duration, Utc};
use libsweep::{CleanOptions, Cleaner, Policy, Repository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "localhost:5000/team/app".to_string());
    let repository: Repository = path.parse()?;
    println!("Sweep Library - Basic Usage Example\n");
    println!("Repository: {} ({})\n", repository, repository.base_url());

    let cleaner = Cleaner::builder().concurrency(4).build()?;

    // Untagged images older than two weeks, keeping the newest five
    let policy = Policy::new(Utc::now() - Duration::weeks(2)).with_keep(5);
    let options = CleanOptions::new(policy).with_recursive(true);

    let plan = match cleaner.plan(&repository, &options).await {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("✗ Failed to collect manifests: {}", e);
            eprintln!("  Make sure a registry is running at {}", repository.base_url());
            return Ok(());
        }
    };

    println!(
        "{} kept, {} ineligible, {} would be deleted:",
        plan.kept_count(),
        plan.ineligible_count(),
        plan.doomed().len()
    );
    for record in plan.doomed() {
        println!(
            "  {}@{}  created {}",
            record.repository(),
            record.digest().short(),
            libsweep::format::format_timestamp(&record.info().created)
        );
    }

    // Dry run: same list the real run would return, no delete requests sent
    let execution = cleaner.execute(&plan, true).await;
    println!("\n✓ Dry run reported {} manifests", execution.deleted.len());

    Ok(())
}
