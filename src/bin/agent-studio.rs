use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use agentstudio::utils::LoggingConfig;
use agentstudio::{
    reduce, workflow_inputs, ActiveNode, EventsResponse, HttpStudioClient, RunController,
    StudioApi, StudioConfig, StudioContext, TraceEvent, WorkflowTopology,
};
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "agent-studio", version, about = "Agent Studio workflow console", author)]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Kick off a workflow and follow its trace until it finishes
    Run {
        #[arg(long)]
        topology: PathBuf,
        #[arg(long = "input", value_parser = parse_key_value)]
        inputs: Vec<(String, String)>,
        /// User message for conversational workflows
        #[arg(long)]
        message: Option<String>,
    },
    /// Replay a saved event list through the diagram reducer
    Replay {
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        topology: PathBuf,
        #[arg(long)]
        upto: Option<usize>,
    },
    /// Print the inputs a workflow expects
    Inputs {
        #[arg(long)]
        topology: PathBuf,
    },
    /// Fetch the events recorded for a trace
    Events {
        #[arg(long)]
        trace_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => StudioConfig::from_file(path)?.merge_env()?,
        None => StudioConfig::from_env()?,
    };

    match cli.command {
        Command::Run {
            topology,
            inputs,
            message,
        } => handle_run(config, topology, inputs, message).await?,
        Command::Replay {
            events,
            topology,
            upto,
        } => handle_replay(events, topology, upto)?,
        Command::Inputs { topology } => handle_inputs(topology)?,
        Command::Events { trace_id } => handle_events(config, trace_id).await?,
    }
    Ok(())
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

async fn handle_run(
    config: StudioConfig,
    topology_path: PathBuf,
    inputs: Vec<(String, String)>,
    message: Option<String>,
) -> anyhow::Result<()> {
    let topology = WorkflowTopology::load(&topology_path)?;
    let conversational = topology.workflow.is_conversational;
    let client = Arc::new(HttpStudioClient::from_config(&config)?);
    let context = Arc::new(StudioContext::new());
    let controller = RunController::new(client, Arc::clone(&context), topology.clone())
        .with_poll_interval(config.poll_interval());

    let trace_id = if conversational {
        let message = message.ok_or_else(|| anyhow!("conversational workflows need --message"))?;
        controller.send_message(&message).await?
    } else {
        controller.kickoff(inputs.into_iter().collect::<HashMap<_, _>>()).await?
    };
    println!("trace: {trace_id}");

    let mut last: Vec<ActiveNode> = Vec::new();
    loop {
        let nodes = context.active_nodes(&topology);
        if nodes != last {
            render_nodes(&nodes);
            last = nodes;
        }
        if !controller.is_polling() {
            break;
        }
        tokio::time::sleep(config.poll_interval()).await;
    }
    let finished = controller.wait().await;

    let state = context.run_state();
    let output = if conversational {
        state.chat_messages.last().map(|m| m.content.clone())
    } else {
        state.crew_output.clone()
    };
    println!("{}", output.unwrap_or_default());

    finished?;
    Ok(())
}

fn render_nodes(nodes: &[ActiveNode]) {
    if nodes.is_empty() {
        println!("-- idle");
        return;
    }
    for node in nodes {
        let marker = if node.is_most_recent { "*" } else { " " };
        println!(
            "{marker} {:<24} {:<11} {}",
            node.id,
            format!("{:?}", node.info_type),
            node.info.as_deref().unwrap_or("")
        );
    }
}

fn handle_replay(
    events_path: PathBuf,
    topology_path: PathBuf,
    upto: Option<usize>,
) -> anyhow::Result<()> {
    let topology = WorkflowTopology::load(&topology_path)?;
    let content = fs::read_to_string(&events_path)
        .with_context(|| format!("failed to read `{}`", events_path.display()))?;
    let events: Vec<TraceEvent> = match serde_json::from_str::<Value>(&content)? {
        Value::Array(items) => serde_json::from_value(Value::Array(items))?,
        other => serde_json::from_value::<EventsResponse>(other)?.events,
    };

    let end = match upto {
        Some(index) => index.saturating_add(1).min(events.len()),
        None => events.len(),
    };
    let nodes = reduce(&events[..end], &topology);
    println!("{}", serde_json::to_string_pretty(&nodes)?);
    Ok(())
}

fn handle_inputs(topology_path: PathBuf) -> anyhow::Result<()> {
    let topology = WorkflowTopology::load(&topology_path)?;
    let inputs = workflow_inputs(&topology);
    if inputs.is_empty() {
        println!("Workflow `{}` takes no inputs", topology.workflow.name);
    } else {
        for input in inputs {
            println!("{input}");
        }
    }
    Ok(())
}

async fn handle_events(config: StudioConfig, trace_id: String) -> anyhow::Result<()> {
    let client = HttpStudioClient::from_config(&config)?;
    let response = client.events(&trace_id).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
