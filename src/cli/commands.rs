// src/cli/commands.rs
// Command handlers: one protocol call (or polling loop) per subcommand

use anyhow::{Context, Result, bail};
use sri_types::{Component, DetailKey, LegacyResourceSummary, OutcomeStatus, TestRunParameters};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::{Commands, GlobalArgs, render, serve};
use crate::client::SriTestingClient;
use crate::config::Settings;
use crate::fixtures;
use crate::report;

/// Client for this invocation: the canned mock with `--mock`, otherwise HTTP
pub fn build_client(global: &GlobalArgs, settings: &Settings) -> Result<SriTestingClient> {
    if global.mock {
        debug!("using canned mock transport");
        return Ok(SriTestingClient::new(Arc::new(fixtures::sri_testing_mock()?)));
    }
    debug!(api_url = %settings.api_url, "using HTTP transport");
    Ok(SriTestingClient::http(settings.api_url.clone(), settings.timeout))
}

fn parse_component(value: &str) -> Result<Component> {
    Component::parse(value).with_context(|| format!("unknown component '{}' (expected KP or ARA)", value))
}

/// Run one subcommand to completion
pub async fn dispatch(global: &GlobalArgs, command: Commands, settings: &Settings) -> Result<()> {
    if let Commands::Serve { canned, step, .. } = command {
        return serve::run_server(settings, canned, step).await;
    }
    if let Commands::Convert { path } = &command {
        return convert(path);
    }

    let client = build_client(global, settings)?;

    match command {
        Commands::Run {
            trapi_version,
            biolink_version,
            timeout,
            log,
            wait,
        } => {
            let parameters = TestRunParameters {
                trapi_version,
                biolink_version,
                timeout,
                log,
            };
            let session = client.run_tests(&parameters).await?;
            println!("{}", session.test_run_id);
            if wait {
                watch(&client, &session.test_run_id, settings).await?;
            }
        }
        Commands::Status { run_id } => {
            let status = client.status(&run_id).await?;
            println!("{}", render::status_line(&status));
        }
        Commands::Summary {
            run_id,
            json,
            failures,
        } => {
            let report = client.summary_checked(&run_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let tally = report::verify(&report)?;
                print!("{}", render::report_table(&report, &tally));
            }
            if failures {
                print!("{}", render::findings(&report::findings(&report, OutcomeStatus::Failed)));
            }
        }
        Commands::Details {
            component,
            resource,
            test_id,
            idx,
            run_id,
        } => {
            let key = DetailKey::new(parse_component(&component)?, resource, test_id, idx);
            let details = client.details(run_id.as_deref(), &key).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
        Commands::List => {
            for run_id in client.list_runs().await? {
                println!("{}", run_id);
            }
        }
        Commands::Registry { component } => {
            let component = component.as_deref().map(parse_component).transpose()?;
            let registry = client.registry().await?;
            print!("{}", render::registry(registry, component));
        }
        Commands::Index { run_id } => {
            let index = client.index(&run_id).await?;
            print!("{}", render::index(&run_id, &index));
        }
        Commands::Resource { run_id, kp, ara } => {
            if kp.is_none() && ara.is_none() {
                bail!("give --kp, or --ara together with --kp");
            }
            let cases = client
                .resource_summary(&run_id, ara.as_deref(), kp.as_deref())
                .await?;
            print!("{}", render::test_cases(&cases));
        }
        Commands::Response {
            run_id,
            edge_num,
            test_id,
            kp,
            ara,
        } => {
            if kp.is_none() {
                bail!("give --kp, optionally together with --ara");
            }
            let message = client
                .response(&run_id, edge_num, &test_id, ara.as_deref(), kp.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&message)?);
        }
        Commands::Watch { run_id } => {
            watch(&client, &run_id, settings).await?;
        }
        Commands::Serve { .. } | Commands::Convert { .. } => {}
    }

    Ok(())
}

/// Poll to completion, printing progress, then print the tallied report
async fn watch(client: &SriTestingClient, run_id: &str, settings: &Settings) -> Result<()> {
    let mut tracker = client
        .wait_for_completion(run_id, &settings.poll, |t| eprintln!("{}", render::progress_line(t)))
        .await?;
    let report = client.summary(run_id).await?;
    tracker.report_fetched()?;
    info!(run_id = %run_id, phase = %tracker.phase(), "report retrieved");

    let tally = report::verify(&report)?;
    print!("{}", render::report_table(&report, &tally));
    Ok(())
}

fn convert(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let legacy: LegacyResourceSummary = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", path.display()))?;

    if let Some((component, resource)) = legacy
        .summary
        .document_key
        .as_deref()
        .and_then(report::legacy_resource_key)
    {
        println!("{} {} (test run {})", component, resource, legacy.test_run_id);
    }
    let cases = report::legacy_to_test_cases(&legacy)?;
    print!("{}", render::test_cases(&cases));
    Ok(())
}
