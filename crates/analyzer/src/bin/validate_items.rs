//! Validates the item bank against `Item::validate()`. Prints per-item
//! errors to stderr and a summary to stdout; exits non-zero on any failure.

use studyforge_config::AppConfig;
use studyforge_storage::load_item_bank;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = AppConfig::from_env()?;
    let items = load_item_bank(&config.scope_dirs).await?;

    let mut failures = 0usize;
    for item in &items {
        let errors = item.validate();
        if !errors.is_empty() {
            failures += 1;
            eprintln!("{}:", item.id);
            for error in &errors {
                eprintln!("  - {error}");
            }
        }
    }

    println!("checked {} items, {} failed validation", items.len(), failures);

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
