use tracing::{error, info};

use crate::args::Action;
use crate::bench::{OrgId, WorkloadOrchestrator, join_ids};
use crate::error::AppResult;
use crate::report::{aggregate, print_report};
use crate::runner::{BenchTarget, ParallelRunner, ProcessLauncher};

use super::types::RunPlan;

pub(crate) async fn execute_plan(plan: RunPlan) -> AppResult<()> {
    match plan {
        RunPlan::Worker => crate::runner::worker::serve().await,
        RunPlan::Bench { target, action } => {
            info!("Running '{}' against {}", action.name(), target.hostname);
            let outcome = execute_action(&target, action).await;
            if let Err(err) = &outcome {
                error!("{}", err);
            }
            outcome
        }
    }
}

async fn execute_action(target: &BenchTarget, action: Action) -> AppResult<()> {
    match action {
        Action::Check => {
            let mut orchestrator = target.start().await?;
            let outcome = orchestrator.check().await;
            orchestrator.close().await;
            outcome?;
            info!("Server is in its baseline state");
            Ok(())
        }
        Action::Setup => {
            let mut orchestrator = target.start().await?;
            let outcome = check_and_setup(&mut orchestrator).await;
            orchestrator.close().await;
            let orgs = outcome?;
            println!("{}", join_ids(&orgs));
            Ok(())
        }
        Action::Run { workers } => {
            let runner = ParallelRunner::new(ProcessLauncher::new(target.clone())?);
            let results = runner.run_all(workers).await?;
            print_report(&aggregate(&results));
            Ok(())
        }
        Action::Cleanup { orgs } => {
            let mut orchestrator = target.resume().await?;
            let outcome = orchestrator.cleanup(&orgs).await;
            orchestrator.close().await;
            outcome
        }
    }
}

async fn check_and_setup(orchestrator: &mut WorkloadOrchestrator) -> AppResult<Vec<OrgId>> {
    orchestrator.check().await?;
    orchestrator.setup().await
}
