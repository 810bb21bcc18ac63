use crate::cli::{IntrospectArgs, NavigateArgs, RunArgs};
use anyhow::{bail, Context, Result};
use colored::Colorize;
use deskpilot::{
    default_registry, AgentConfig, AllowlistValidator, ChatCompletionsOracle, DecisionOracle,
    Desktop, GuidedNavigator, JsonlAuditLog, NavigationRequest, NavigationStatus, Plan,
    PlanExecutor, PlanValidator, StepStatus, ValidationReport, BUILTIN_ACTIONS,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    let config = match path {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => AgentConfig::default(),
    };
    Ok(config.apply_env())
}

fn oracle(config: &AgentConfig) -> Option<Arc<dyn DecisionOracle>> {
    match ChatCompletionsOracle::new(config.oracle.clone()) {
        Ok(oracle) => Some(Arc::new(oracle)),
        Err(e) => {
            debug!("[config] No decision oracle: {e}");
            None
        }
    }
}

fn print_validation(report: &ValidationReport) {
    for warning in &report.warnings {
        println!("{} {warning}", "⚠".yellow());
    }
    if let Some(error) = &report.error {
        println!("{} {error}", "✗".red());
    }
}

pub async fn run_plan(args: RunArgs, config: AgentConfig) -> Result<()> {
    let raw = std::fs::read_to_string(&args.plan)
        .with_context(|| format!("Failed to read plan {}", args.plan.display()))?;
    let plan: Plan = serde_json::from_str(&raw).context("Plan is not valid JSON")?;

    let validator =
        AllowlistValidator::with_known_actions(config.validation.clone(), BUILTIN_ACTIONS.iter().copied());
    let report = validator.validate(&plan);
    print_validation(&report);
    if !report.valid {
        bail!("Plan rejected");
    }

    println!(
        "{} {}",
        "PLAN".bold().cyan(),
        format!("{} steps", plan.len()).dimmed()
    );
    for (i, step) in plan.steps.iter().enumerate() {
        let marker = if step.critical { " (critical)".red().to_string() } else { String::new() };
        println!(
            "  {}. {} {}{marker}",
            i + 1,
            step.action.bold(),
            serde_json::Value::Object(step.args.clone()).to_string().dimmed()
        );
    }
    if args.dry_run {
        println!("{}", "Dry run: nothing executed".green());
        return Ok(());
    }

    let desktop = Desktop::new(config.discovery.clone())?;
    let registry = default_registry(desktop, oracle(&config), config.navigation.clone());
    let mut executor = PlanExecutor::new(registry);
    if !args.no_audit && config.audit.enabled {
        let path = args.audit_log.unwrap_or_else(|| config.audit.resolved_path());
        executor = executor.with_audit(Arc::new(JsonlAuditLog::new(path)));
    }

    let report = executor.execute(&plan).await;
    println!();
    for (i, result) in report.results.iter().enumerate() {
        match result.status {
            StepStatus::Success => println!(
                "{} {}. {} {}",
                "✓".green(),
                i + 1,
                result.action.bold(),
                result.output.to_string().dimmed()
            ),
            StepStatus::Error => println!(
                "{} {}. {} {}",
                "✗".red(),
                i + 1,
                result.action.bold(),
                result.error.as_deref().unwrap_or_default().red()
            ),
        }
    }
    println!("\n{}", report.summary().bold());

    if report.aborted {
        bail!("Plan stopped on a critical failure");
    }
    Ok(())
}

pub async fn introspect(args: IntrospectArgs, config: AgentConfig) -> Result<()> {
    let desktop = Desktop::new(config.discovery)?;
    let Some(snapshot) = desktop.introspect(&args.windows, args.open.as_deref()).await else {
        bail!("No window matching {:?}", args.windows);
    };

    println!(
        "{} {}",
        snapshot.window.bold().cyan(),
        format!("({} controls)", snapshot.controls.len()).dimmed()
    );
    for control in &snapshot.controls {
        let mut line = format!("  {:<14} {}", control.kind.to_string(), control.name);
        if let Some(state) = control.state {
            line.push_str(&format!(" [{state}]"));
        }
        if let Some(range) = control.value {
            line.push_str(&format!(" [{} in {}..{}]", range.current, range.min, range.max));
        }
        if control.clickable {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}

pub async fn navigate(args: NavigateArgs, config: AgentConfig) -> Result<()> {
    let Some(oracle) = oracle(&config) else {
        bail!("navigate needs a decision oracle; set OPENAI_API_KEY");
    };
    let desktop = Desktop::new(config.discovery.clone())?;
    let navigator = GuidedNavigator::new(desktop, oracle, config.navigation.clone());

    let mut request = NavigationRequest::new(args.goal, args.windows);
    request.open_command = args.open;
    request.max_attempts = args.max_attempts;
    request.max_steps = args.max_steps;
    request.multi_step = !args.single_step;

    info!("Navigating: {}", request.goal);
    let outcome = navigator.navigate(&request).await?;

    let status = match outcome.status {
        NavigationStatus::Achieved => "ACHIEVED".green().bold(),
        NavigationStatus::LikelyAchieved => "LIKELY ACHIEVED".yellow().bold(),
        NavigationStatus::MaxStepsReached => "STEP LIMIT".yellow().bold(),
    };
    println!("{status} {}", outcome.message);
    for (i, step) in outcome.steps_completed.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
    Ok(())
}

pub fn list_actions(config: AgentConfig) -> Result<()> {
    let desktop = Desktop::new(config.discovery.clone())?;
    let registry = default_registry(desktop, oracle(&config), config.navigation);
    for (name, description) in registry.describe() {
        println!("{:<20} {}", name.bold(), description.dimmed());
    }
    Ok(())
}
