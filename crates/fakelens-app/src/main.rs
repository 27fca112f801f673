#![warn(missing_docs)]
//! # fakelens-app binary
//!
//! Headless entry point for fakelens.

/// CLI entry point.
fn main() {
    println!("fakelens-app {}", fakelens_app::app_version());
    println!(
        "analysis_endpoint={} (FAKELENS_ANALYSIS_ENDPOINT)",
        fakelens_app::analysis_endpoint_from_env()
    );
    println!(
        "insights_enabled={} (FAKELENS_INSIGHTS_ENABLED)",
        fakelens_app::insights_enabled_from_env()
    );

    match fakelens_app::RunLogger::new(&std::env::temp_dir()) {
        Ok(logger) => {
            logger.info("startup", "version", fakelens_app::app_version());
            logger.info(
                "startup",
                "endpoint",
                &fakelens_app::analysis_endpoint_from_env(),
            );
            logger.info("startup", "report_date", &fakelens_app::current_iso_date());
            println!("run_log={}", logger.path().display());
        }
        Err(error) => eprintln!("run log unavailable: {error}"),
    }
}
