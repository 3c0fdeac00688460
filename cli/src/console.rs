//! Interactive operator console.
//!
//! Commands are read line by line. Verifications run in the background so the
//! operator can keep working (or disconnect) while a transaction confirms;
//! their results are printed as they arrive. `disconnect` abandons running
//! confirmations; `quit` waits for them, then disconnects.

use async_trait::async_trait;
use reclaim_admin::{AdminContext, AdminError, AmountPrompt, FixedAmount, WorkflowState};
use reclaim_types::ReportId;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::sync::mpsc;

use crate::render;

const HELP: &str = "\
commands:
  connect          connect the wallet and load reports
  disconnect       drop the wallet session
  status           show the connected wallet
  list             show reports
  refresh          reload reports from the backend
  evidence <id>    show or hide a report's evidence link
  verify <id>      verify a report and pay its reward
  help             show this help
  quit             wait for running verifications, disconnect and exit";

const AMOUNT_QUESTION: &str = "Enter reward amount (in ETH): ";

/// Reads the reward amount from the next input line. Blank or EOF cancels.
pub struct LinePrompt<'a, R, W> {
    lines: &'a mut Lines<R>,
    out: &'a mut W,
}

impl<'a, R, W> LinePrompt<'a, R, W> {
    pub fn new(lines: &'a mut Lines<R>, out: &'a mut W) -> Self {
        Self { lines, out }
    }
}

#[async_trait]
impl<'a, R, W> AmountPrompt for LinePrompt<'a, R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn request_amount(&mut self, _report_id: ReportId) -> Option<String> {
        self.out.write_all(AMOUNT_QUESTION.as_bytes()).await.ok()?;
        self.out.flush().await.ok()?;
        let line = self.lines.next_line().await.ok()??;
        let line = line.trim();
        (!line.is_empty()).then(|| line.to_string())
    }
}

enum Command {
    Connect,
    Disconnect,
    Status,
    List,
    Refresh,
    Evidence(ReportId),
    Verify(ReportId),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let name = words.next().unwrap_or_default();
    let id = |arg: Option<&str>| -> Result<ReportId, String> {
        let arg = arg.ok_or_else(|| format!("usage: {name} <id>"))?;
        arg.parse().map_err(|e| format!("{e}"))
    };
    match name {
        "connect" => Ok(Command::Connect),
        "disconnect" => Ok(Command::Disconnect),
        "status" => Ok(Command::Status),
        "list" | "ls" => Ok(Command::List),
        "refresh" => Ok(Command::Refresh),
        "evidence" => id(words.next()).map(Command::Evidence),
        "verify" => id(words.next()).map(Command::Verify),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}; type `help`")),
    }
}

/// Run the console until `quit` or end of input.
pub async fn run<R, W>(ctx: Arc<AdminContext>, input: R, mut out: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let mut lines = input.lines();
    let (events_tx, mut events) = mpsc::unbounded_channel::<String>();
    let mut running = 0usize;

    say(&mut out, HELP).await?;
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match parse_command(line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if handle(&ctx, command, &mut lines, &mut out, &events_tx).await? {
                            running += 1;
                        }
                    }
                    Err(message) => say(&mut out, &message).await?,
                }
            }
            Some(event) = events.recv() => {
                running = running.saturating_sub(1);
                say(&mut out, &event).await?;
            }
        }
    }

    while running > 0 {
        let Some(event) = events.recv().await else { break };
        running -= 1;
        say(&mut out, &event).await?;
    }
    ctx.disconnect().await;
    Ok(())
}

/// Returns whether a background verification was started.
async fn handle<R, W>(
    ctx: &Arc<AdminContext>,
    command: Command,
    lines: &mut Lines<R>,
    out: &mut W,
    events: &mpsc::UnboundedSender<String>,
) -> anyhow::Result<bool>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    match command {
        Command::Connect => match ctx.connect().await {
            Ok(outcome) => {
                say(out, &render::session(&outcome.session)).await?;
                match outcome.sync {
                    Ok(sync) => say(out, &render::sync(&sync)).await?,
                    Err(e) => say(out, &e.notice()).await?,
                }
            }
            Err(e) => say(out, &e.notice()).await?,
        },
        Command::Disconnect => {
            let session = ctx.disconnect().await;
            say(out, &render::session(&session)).await?;
        }
        Command::Status => say(out, &render::session(&ctx.session().await)).await?,
        Command::List => say(out, &render::reports(&ctx.reports().await)).await?,
        Command::Refresh => match ctx.sync_reports().await {
            Ok(sync) => say(out, &render::sync(&sync)).await?,
            Err(e) => say(out, &e.notice()).await?,
        },
        Command::Evidence(id) => {
            let message = match ctx.report(id).await {
                None => format!("no visible report #{id}"),
                Some(report) => match report.evidence_link {
                    None => format!("case #{id} has no evidence"),
                    Some(link) => match ctx.toggle_evidence(&link).await {
                        Some(shown) => format!("showing evidence for case #{id}: {shown}"),
                        None => "evidence hidden".to_string(),
                    },
                },
            };
            say(out, &message).await?;
        }
        Command::Verify(id) => {
            // Refuse before asking for an amount.
            if !ctx.session().await.is_authorized() {
                say(out, &AdminError::NotReady.notice()).await?;
                return Ok(false);
            }
            if ctx.workflow_state(id) != WorkflowState::Idle {
                say(out, &AdminError::AlreadyPending(id).notice()).await?;
                return Ok(false);
            }
            let amount = LinePrompt::new(lines, out).request_amount(id).await;
            let ctx = ctx.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let mut prompt = match amount {
                    Some(amount) => FixedAmount::new(amount),
                    None => FixedAmount::cancelled(),
                };
                let message = match ctx.verify_report(id, &mut prompt).await {
                    Ok(outcome) => render::verification(&outcome),
                    Err(e) => e.notice(),
                };
                let _ = events.send(message);
            });
            say(out, &format!("verification of case #{id} started")).await?;
            return Ok(true);
        }
        Command::Help => say(out, HELP).await?,
        Command::Quit => {}
    }
    Ok(false)
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> anyhow::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}
