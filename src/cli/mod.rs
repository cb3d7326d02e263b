//! CLI commands for HiveMind using clap.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{load_settings, Settings};
use crate::cycle::{CycleOutcome, TurnCycle};
use crate::heartbeat::{run_watch, CycleSchedule};
use crate::mailbox::{Mailbox, Priority};
use crate::protocol::{parse_turns, Role};
use crate::store::LogStore;

/// HiveMind - agents taking turns in a shared, git-synced meeting log.
#[derive(Parser)]
#[command(name = "hivemind")]
#[command(version)]
#[command(about = "HiveMind - multi-agent meeting log", long_about = None)]
pub struct Commands {
    /// Path to the YAML config (defaults to $HIVEMIND_CONFIG, ./hivemind.yaml, ./agents/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one turn cycle for an agent
    Cycle {
        /// Agent id from the config
        #[arg(long)]
        agent: String,
    },

    /// Run turn cycles repeatedly
    Watch {
        /// Agent id from the config
        #[arg(long)]
        agent: String,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Stop after this many cycles (omit for continuous)
        #[arg(long)]
        max_cycles: Option<u64>,
    },

    /// Meeting log commands
    #[command(subcommand)]
    Log(LogCommand),

    /// Mailbox commands
    #[command(subcommand, alias = "mb")]
    Mailbox(MailboxCommand),

    /// Start the HTTP tool server
    Serve {
        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List configured agents
    Agents,
}

#[derive(Args)]
#[group(multiple = false)]
pub struct ScheduleArgs {
    /// Seconds between cycles
    #[arg(long, default_value_t = 60)]
    every: u64,

    /// Cron expression (with seconds field), e.g. "0 */5 * * * *"
    #[arg(long)]
    cron: Option<String>,
}

impl ScheduleArgs {
    fn schedule(&self) -> Result<CycleSchedule> {
        match &self.cron {
            Some(expr) => CycleSchedule::cron(expr).map_err(anyhow::Error::msg),
            None => Ok(CycleSchedule::interval(self.every)),
        }
    }
}

#[derive(Subcommand)]
pub enum LogCommand {
    /// Print the parsed turns
    Show {
        /// Read the log as this agent (marks its turns as own)
        #[arg(long = "as")]
        reader: Option<String>,
    },

    /// Append a manual entry as an agent and publish it
    Append {
        /// Agent id from the config
        #[arg(long)]
        agent: String,

        /// Message text
        message: String,
    },
}

#[derive(Subcommand)]
pub enum MailboxCommand {
    /// List registered agents
    List,

    /// Register an agent (creates inbox and outbox)
    Register {
        agent: String,
    },

    /// Drop a task in an agent's inbox
    Task {
        agent: String,

        /// Task content
        content: String,

        /// Job id (generated when omitted)
        #[arg(long)]
        job_id: Option<String>,

        /// Priority: high, normal, low
        #[arg(long, default_value = "normal")]
        priority: Priority,
    },

    /// Read an agent's response for a job
    Response {
        agent: String,
        job_id: String,
    },

    /// Store an immutable artifact for a job
    Artifact {
        job_id: String,
        filename: String,

        /// Artifact content
        content: String,
    },

    /// Show inbox and outbox counts
    Status {
        agent: String,
    },
}

impl Commands {
    /// Run the command.
    pub async fn run(&self) -> Result<()> {
        let settings = load_settings(self.config.as_deref()).context("loading config")?;

        match &self.command {
            Command::Cycle { agent } => cmd_cycle(&settings, agent).await,
            Command::Watch {
                agent,
                schedule,
                max_cycles,
            } => cmd_watch(&settings, agent, schedule, *max_cycles).await,
            Command::Log(cmd) => cmd_log(&settings, cmd),
            Command::Mailbox(cmd) => cmd_mailbox(&settings, cmd),
            Command::Serve { port } => cmd_serve(&settings, *port).await,
            Command::Agents => cmd_agents(&settings),
        }
    }
}

// Command implementations

async fn cmd_cycle(settings: &Settings, agent: &str) -> Result<()> {
    let cycle = TurnCycle::from_settings(settings, agent)?;
    let report = cycle.run().await?;

    match &report.outcome {
        CycleOutcome::Published { entry } => println!("{} replied:\n{}", entry.speaker, entry.content),
        CycleOutcome::Skipped { reason } => println!("Skipped ({:?})", reason),
        CycleOutcome::NoReply => println!("Nothing to add."),
        CycleOutcome::ResponderFailed { error } => println!("Discarded: {}", error),
    }
    Ok(())
}

async fn cmd_watch(
    settings: &Settings,
    agent: &str,
    schedule: &ScheduleArgs,
    max_cycles: Option<u64>,
) -> Result<()> {
    let cycle = TurnCycle::from_settings(settings, agent)?;
    let schedule = schedule.schedule()?;

    let summary = run_watch(&cycle, &schedule, max_cycles).await?;
    println!(
        "{} cycles: {} published, {} skipped, {} failed",
        summary.cycles, summary.published, summary.skipped, summary.failed
    );
    Ok(())
}

fn cmd_log(settings: &Settings, cmd: &LogCommand) -> Result<()> {
    match cmd {
        LogCommand::Show { reader } => {
            let reader = match reader {
                Some(id) => settings.identity(id)?.display_name,
                None => String::new(),
            };
            let raw = LogStore::new(settings.log_path()).read()?;
            let turns = parse_turns(&raw, &reader);

            if turns.is_empty() {
                println!("(empty log)");
            }
            for turn in turns {
                let tag = match turn.role {
                    Role::Own => " (self)",
                    Role::Other => "",
                };
                let speaker = if turn.speaker.is_empty() { "-" } else { &turn.speaker };
                println!("[{}{}]\n{}\n", speaker, tag, turn.content);
            }
        }
        LogCommand::Append { agent, message } => {
            let cycle = TurnCycle::from_settings(settings, agent)?;
            let entry = cycle.post(message)?;
            println!("Appended entry for {}", entry.speaker);
        }
    }
    Ok(())
}

fn cmd_mailbox(settings: &Settings, cmd: &MailboxCommand) -> Result<()> {
    let mailbox = Mailbox::open(settings.root_dir())?;

    match cmd {
        MailboxCommand::List => {
            let agents = mailbox.list_agents()?;
            if agents.is_empty() {
                println!("No agents registered.");
            }
            for agent in agents {
                println!("{}", agent);
            }
        }
        MailboxCommand::Register { agent } => {
            let dir = mailbox.register_agent(agent)?;
            println!("Agent {} registered at {}", agent, dir.display());
        }
        MailboxCommand::Task {
            agent,
            content,
            job_id,
            priority,
        } => {
            let job_id = job_id
                .clone()
                .unwrap_or_else(|| ulid::Ulid::new().to_string().to_lowercase());
            let path = mailbox.create_task(agent, &job_id, content, *priority)?;
            println!("Task {} created at {}", job_id, path.display());
        }
        MailboxCommand::Response { agent, job_id } => {
            println!("{}", mailbox.read_response(agent, job_id)?.into_text());
        }
        MailboxCommand::Artifact {
            job_id,
            filename,
            content,
        } => {
            let path = mailbox.store_artifact(job_id, filename, content)?;
            println!("Artifact stored at {}", path.display());
        }
        MailboxCommand::Status { agent } => {
            let status = mailbox.status(agent)?;
            println!(
                "{}: inbox={} outbox={}",
                status.name, status.inbox_count, status.outbox_count
            );
        }
    }
    Ok(())
}

async fn cmd_serve(settings: &Settings, port: Option<u16>) -> Result<()> {
    let mut server = settings.server.clone();
    if let Some(port) = port {
        server.port = port;
    }
    println!("Serving tools on http://{}:{}", server.host, server.port);
    crate::web::run_server(settings, &server).await?;
    Ok(())
}

fn cmd_agents(settings: &Settings) -> Result<()> {
    for id in settings.agent_ids() {
        let agent = settings.agent(&id)?;
        let identity = settings.identity(&id)?;
        println!(
            "{:<16} {:<20} {}{}",
            id,
            identity.display_name,
            agent.provider,
            agent
                .model
                .as_deref()
                .map(|m| format!(" ({})", m))
                .unwrap_or_default()
        );
    }
    Ok(())
}
