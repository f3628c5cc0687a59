use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use area_selection::SelectedArea;
use clap::Args;
use page_dom::{Dom, MemoryDom, PageFixture, RecordedEvent};
use serde::Serialize;
use taxy_core_types::SelectionType;
use taxy_state_center::HistoryEntry;
use tokio::fs;
use tracing::info;

use super::output::{print_structured, OutputFormat};
use crate::background::{StaticCapture, TabCapture};
use crate::cli::context::CliContext;
use crate::interceptor::InterceptOutcome;
use crate::pipeline::PipelineContext;
use crate::planner::CommandListPlanner;
use crate::session::Session;

/// 1x1 transparent PNG handed out when no capture image is given.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Page fixture (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub page: PathBuf,

    /// Override the page URL from the fixture
    #[arg(long)]
    pub url: Option<String>,

    /// State file (defaults to `state_path` from the configuration)
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Select an area before running commands, e.g. `input=#prompt`
    #[arg(long = "select", value_name = "TYPE=SELECTOR")]
    pub selections: Vec<String>,

    /// File with one chat command per line
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// PNG returned by screen captures
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,

    /// Chat texts, e.g. `/taxy click "#submit"`
    pub commands: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CommandReport {
    command: String,
    #[serde(flatten)]
    outcome: InterceptOutcome,
}

#[derive(Debug, Serialize)]
struct RunReport {
    location: String,
    selections: Vec<SelectedArea>,
    results: Vec<CommandReport>,
    history: Vec<HistoryEntry>,
    events: Vec<RecordedEvent>,
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, format: &OutputFormat) -> Result<()> {
    let mut fixture = PageFixture::from_path(&args.page)
        .with_context(|| format!("Failed to load page fixture {}", args.page.display()))?;
    if let Some(url) = &args.url {
        fixture.url = Some(url.clone());
    }

    let mut commands = args.commands.clone();
    if let Some(script) = &args.script {
        let content = fs::read_to_string(script)
            .await
            .with_context(|| format!("Failed to read script {}", script.display()))?;
        commands.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    let selections = args
        .selections
        .iter()
        .map(|spec| parse_selection(spec))
        .collect::<Result<Vec<_>>>()?;

    let capture: Arc<dyn TabCapture> = match &args.capture {
        Some(path) => Arc::new(StaticCapture::new(
            fs::read(path)
                .await
                .with_context(|| format!("Failed to read capture image {}", path.display()))?,
        )),
        None => Arc::new(StaticCapture::new(PLACEHOLDER_PNG.to_vec())),
    };

    let mut config = ctx.config().clone();
    config.state_path = ctx.state_path(args.state.as_ref());
    let pipeline = PipelineContext::open(config)?;
    let session = Session::start(
        pipeline,
        capture,
        Some(Arc::new(CommandListPlanner::new())),
    );

    let dom = Arc::new(fixture.build());
    let page = session.open_tab(dom.clone());
    info!(tab = %page.tab, location = %dom.location(), commands = commands.len(), "running page session");

    let mut selected = Vec::new();
    for (selection_type, selector) in selections {
        selected.push(session.select_area(&page, selection_type, &selector).await?);
    }

    let mut results = Vec::new();
    for command in commands {
        let outcome = page.submit(&command).await;
        results.push(CommandReport { command, outcome });
    }

    let report = RunReport {
        location: dom.location(),
        selections: selected,
        results,
        history: session.context().state().history(),
        events: dom.events(),
    };
    session.close_tab(page);
    session.shutdown();

    if !print_structured(format, &report)? {
        print_human(&report, &dom);
    }
    Ok(())
}

fn parse_selection(spec: &str) -> Result<(SelectionType, String)> {
    let Some((kind, selector)) = spec.split_once('=') else {
        bail!("Invalid selection '{spec}', expected TYPE=SELECTOR");
    };
    let selection_type = kind
        .parse::<SelectionType>()
        .with_context(|| format!("Invalid selection '{spec}'"))?;
    if selector.trim().is_empty() {
        bail!("Invalid selection '{spec}', the selector is empty");
    }
    Ok((selection_type, selector.trim().to_string()))
}

fn print_human(report: &RunReport, dom: &MemoryDom) {
    for area in &report.selections {
        println!("selected {} area: {}", area.selection_type.as_str(), area.selector);
    }
    for entry in &report.results {
        match &entry.outcome {
            InterceptOutcome::Ignored => println!("- {}: not a command", entry.command),
            InterceptOutcome::Help { text } => println!("? {}\n{}", entry.command, text),
            InterceptOutcome::Rejected { result } | InterceptOutcome::Executed { result } => {
                if result.success {
                    println!("ok {}", entry.command);
                } else {
                    println!(
                        "failed {}: {}",
                        entry.command,
                        result.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
    }
    println!("location: {}", report.location);
    println!("history ({} entries):", report.history.len());
    for entry in &report.history {
        println!("  {}", entry.text);
    }
    println!("events:");
    for event in &report.events {
        let tag = dom
            .element(event.target)
            .map(|info| info.tag)
            .unwrap_or_else(|| "?".to_string());
        println!("  {} on <{}> {}", event.kind, tag, event.target);
    }
}
