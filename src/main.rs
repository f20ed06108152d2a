//! psjudge - sample suite runner
//!
//! Runs the bundled sample suites through the harness and exits non-zero if
//! any case fails. Set `PSJUDGE_REPORT_JSON=1` to print the reports as JSON.

use std::process::ExitCode;

use psjudge::constants::env_keys;
use psjudge::{samples, telemetry, CaseExecutor, HarnessConfig, Suite, SuiteReport};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = HarnessConfig::from_env()?;
    telemetry::init(&config);

    tracing::info!(
        ceiling_ms = config.timeout_ceiling.as_millis() as u64,
        echo_output = config.echo_output,
        "Starting psjudge sample run"
    );

    let suites = vec![
        Suite::builder("fence")
            .with_config(&config)
            .solution(samples::fence)
            .cases([
                ("3\n7\n7 1 5 9 6 7 3", "20"),
                ("3\n7\n7 1 5 9 6 7 3\n7\n1 4 4 4 4 1 1\n4\n1 8 2 2\n", "20\n16\n8"),
            ])
            .build()?,
        Suite::builder("sum")
            .with_config(&config)
            .solution(samples::sum)
            .case("1 2", "3")
            .case("10\n-4\n", "6")
            .build()?,
        Suite::builder("echo")
            .with_config(&config)
            .solution(samples::echo)
            .case("  keep leading\nspace  ", "  keep leading\nspace")
            .build()?,
    ];

    let executor = CaseExecutor::new(&config);
    let mut reports: Vec<SuiteReport> = Vec::with_capacity(suites.len());
    for suite in &suites {
        reports.push(suite.run(&executor).await);
    }

    if std::env::var(env_keys::REPORT_JSON).is_ok_and(|v| v == "1") {
        for report in &reports {
            println!("{}", report.to_json()?);
        }
    }

    let failed: Vec<&SuiteReport> = reports.iter().filter(|r| !r.all_passed()).collect();
    if failed.is_empty() {
        tracing::info!(suites = reports.len(), "All sample suites passed");
        Ok(ExitCode::SUCCESS)
    } else {
        for report in failed {
            tracing::error!(
                suite = %report.name,
                passed = report.passed_count,
                total = report.total_count,
                "Suite failed"
            );
        }
        Ok(ExitCode::FAILURE)
    }
}
