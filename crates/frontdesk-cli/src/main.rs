//! CLI entry point for Frontdesk.
//!
//! This binary provides the `frontdesk` command with subcommands for
//! checking provider connectivity, running a one-shot chat turn against the
//! configured provider, and inspecting the assembled system prompt.

use anyhow::Result;
use clap::{Parser, Subcommand};
use frontdesk_agent::config::AiConfig;
use frontdesk_agent::executor::ToolExecutor;
use frontdesk_agent::llm::provider_from_config;
use frontdesk_agent::orchestrator::ResponseOrchestrator;
use frontdesk_agent::prompts::system::{PromptContext, build_system_prompt};
use frontdesk_agent::prompts::tools::ToolCapabilities;
use frontdesk_agent::store::ResponseStyle;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Frontdesk — AI response pipeline operator tools.
#[derive(Parser)]
#[command(
    name = "frontdesk",
    version,
    about = "Frontdesk — AI helpdesk operator tools",
    long_about = "Operator tools for the Frontdesk AI response pipeline: provider \
                  diagnostics, one-shot chat turns, and prompt inspection."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configured LLM provider is reachable.
    Doctor,

    /// Run a single chat turn against the configured provider.
    Chat {
        /// The customer message to respond to.
        message: String,

        /// Business name used in the system prompt.
        #[arg(long, default_value = "the company")]
        business_name: String,

        /// Knowledge excerpt to ground the reply, if any.
        #[arg(long)]
        knowledge: Option<String>,

        /// Response style: professional, friendly, casual, or formal.
        #[arg(long, default_value = "professional")]
        style: String,
    },

    /// Print the assembled system prompt and exit.
    Prompt {
        /// Business name used in the system prompt.
        #[arg(long, default_value = "the company")]
        business_name: String,

        /// Knowledge excerpt to include, if any.
        #[arg(long)]
        knowledge: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Doctor => cmd_doctor().await,
        Commands::Chat {
            message,
            business_name,
            knowledge,
            style,
        } => cmd_chat(message, business_name, knowledge, style).await,
        Commands::Prompt {
            business_name,
            knowledge,
        } => cmd_prompt(business_name, knowledge),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: doctor
// ---------------------------------------------------------------------------

async fn cmd_doctor() -> Result<()> {
    init_tracing("warn");

    let config = AiConfig::from_env()?;
    let provider = provider_from_config(&config)?;

    println!();
    println!("  Frontdesk Doctor");
    println!("  ================");
    println!();
    println!("  provider: {}", provider.provider_name());
    println!("  model:    {}", provider.model());
    println!();

    print!("  connectivity: ");
    if provider.health_check().await {
        println!("ok");
        Ok(())
    } else {
        println!("FAILED");
        anyhow::bail!("provider health check failed");
    }
}

// ---------------------------------------------------------------------------
// Subcommand: chat
// ---------------------------------------------------------------------------

async fn cmd_chat(
    message: String,
    business_name: String,
    knowledge: Option<String>,
    style: String,
) -> Result<()> {
    init_tracing("info");

    let config = AiConfig::from_env()?;
    let provider = provider_from_config(&config)?;
    info!(provider = provider.provider_name(), model = provider.model(), "provider ready");

    let style: ResponseStyle =
        serde_json::from_value(serde_json::Value::String(style.to_lowercase()))
            .unwrap_or_default();

    let prompt = PromptContext {
        business_name,
        style_instruction: Some(style.instruction().to_owned()),
        custom_instructions: None,
    };
    // One-shot turn: no CRM or knowledge base wired up, tools degrade to
    // local fallbacks.
    let executor = ToolExecutor::new(Uuid::now_v7(), None, None);
    let orchestrator =
        ResponseOrchestrator::new(provider, executor, ToolCapabilities::default(), prompt);

    let result = orchestrator
        .generate_response(&[], &message, knowledge.as_deref())
        .await;

    println!();
    println!("{}", result.content);
    println!();
    if let Some(escalation) = &result.escalation {
        println!(
            "  [escalation requested: {} ({})]",
            escalation.reason,
            escalation.priority.as_str()
        );
    }
    for (name, tool_result) in &result.tool_results {
        let mark = if tool_result.success { "✓" } else { "✗" };
        println!("  [{mark} {name}: {}]", tool_result.message);
    }
    println!(
        "  [{} tokens, ${:.6}, {}/{}]",
        result.usage.tokens_used,
        result.usage.estimated_cost,
        result.usage.provider,
        result.usage.model
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: prompt
// ---------------------------------------------------------------------------

fn cmd_prompt(business_name: String, knowledge: Option<String>) -> Result<()> {
    init_tracing("warn");

    let context = PromptContext::for_business(business_name);
    let prompt = build_system_prompt(&context, knowledge.as_deref(), chrono::Local::now());
    println!("{prompt}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
