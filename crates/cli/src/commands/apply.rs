//! `statsampler apply <table>`

use std::sync::Arc;

use statsampler_core::{ApplyFlowController, CatalogMetricsCollector, SessionAnalyzeExecutor};
use statsampler_domain::Config;
use statsampler_infra::FileModelStore;

use super::connect;
use crate::args::ApplyArgs;

pub async fn run(config: &Config, args: ApplyArgs) -> anyhow::Result<()> {
    let session = connect(config).await?;

    let model_path = args.model.unwrap_or_else(|| config.apply.model_path.clone());
    let controller = ApplyFlowController::new(
        session.clone(),
        Arc::new(FileModelStore::new(&model_path)),
        Arc::new(CatalogMetricsCollector::new(session.clone())),
        Arc::new(SessionAnalyzeExecutor::new(session)),
    )
    .with_expected_unit(config.estimator.unit);

    if args.full {
        controller.run_full_refresh(&args.table).await?;
        if args.json {
            println!("{}", serde_json::json!({ "table": args.table, "full": true }));
        } else {
            println!("{}: full statistics refresh", args.table);
        }
        return Ok(());
    }

    let outcome = controller.run(&args.table, &model_path).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{}: sampled {} rows ({} {}){}",
            outcome.table,
            outcome.sample_rows,
            outcome.size.value,
            outcome.size.unit,
            if outcome.clamped { ", model prediction clamped" } else { "" }
        );
    }
    Ok(())
}
