//! `statsampler learn <table>...`

use std::sync::Arc;

use statsampler_core::{
    AnalyzeExecutor, CatalogMetricsCollector, ExplainPlanLogger, HeuristicEstimator,
    LearnFlowController, LearnPipeline, LearnReport, RegressionTrainer, SessionAnalyzeExecutor,
};
use statsampler_domain::{Config, FailurePolicy};
use statsampler_infra::FileModelStore;
use tokio_util::sync::CancellationToken;

use super::{cancel_on_interrupt, connect};
use crate::args::LearnArgs;

pub async fn run(config: &Config, args: LearnArgs) -> anyhow::Result<()> {
    let session = connect(config).await?;

    let model_path = args.model.unwrap_or_else(|| config.learn.model_path.clone());
    let policy =
        if args.skip_failures { FailurePolicy::SkipAndContinue } else { config.learn.failure_policy };

    let executor: Arc<dyn AnalyzeExecutor> = Arc::new(SessionAnalyzeExecutor::new(session.clone()));
    let pipeline = LearnPipeline {
        metrics: Arc::new(CatalogMetricsCollector::new(session.clone())),
        estimator: Arc::new(HeuristicEstimator::new(config.estimator.clone())),
        executor: executor.clone(),
        plan_logger: Arc::new(ExplainPlanLogger::new(
            executor,
            config.learn.representative_query.clone(),
        )),
        trainer: Arc::new(RegressionTrainer::new(
            Arc::new(FileModelStore::new(model_path)),
            &config.learn,
            config.estimator.unit,
        )),
    };

    let cancellation = CancellationToken::new();
    let interrupt = cancel_on_interrupt(cancellation.clone());
    let result = LearnFlowController::new(session, pipeline)
        .with_failure_policy(policy)
        .with_cancellation(cancellation)
        .run(&args.tables)
        .await;
    interrupt.abort();

    let report = result?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &LearnReport) {
    println!("learn run {} {}", report.run_id, report.final_state);
    println!("  trained on {} table(s)", report.example_count);
    for table in &report.processed {
        println!("    {table}");
    }
    if !report.skipped.is_empty() {
        println!("  skipped {} table(s)", report.skipped.len());
        for skipped in &report.skipped {
            println!("    {} [{}] {}", skipped.table, skipped.kind, skipped.message);
        }
    }
    println!("  model written to {}", report.model_location);
}
