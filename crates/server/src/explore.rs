//! # Terminal Explorer
//!
//! Drives the orchestrator from the command line: streams the definition
//! as it arrives, then prints the auxiliary panels and a share string.
//! With `--interactive` it keeps reading navigation commands from stdin.

use clap::Args;
use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use weavewiki_core::config::ExplorerConfig;
use weavewiki_core::content::GatewayContentService;
use weavewiki_core::explorer::{AppShell, ShellStatus, ViewEvent, ViewEventKind};
use weavewiki_core::state::{Feature, HistoricalFact, Journey, ViewState};

#[derive(Args, Clone, Debug)]
pub struct ExploreArgs {
    /// Topic to open; defaults to the journey's current topic
    pub topic: Option<String>,
    /// Gateway endpoint, overrides the config file
    #[arg(long)]
    pub gateway: Option<String>,
    /// Shared journey string from a previous session
    #[arg(long)]
    pub journey: Option<String>,
    /// Explorer config file (JSON)
    #[arg(long, default_value = "weavewiki.json")]
    pub config: PathBuf,
    /// Translate the definition into this language code
    #[arg(long)]
    pub lang: Option<String>,
    /// Keep reading navigation commands from stdin
    #[arg(short, long)]
    pub interactive: bool,
}

pub async fn run(args: ExploreArgs) -> anyhow::Result<()> {
    let mut config = ExplorerConfig::load(&args.config).await?;
    if let Some(gateway) = &args.gateway {
        config = config.with_gateway(gateway.clone());
    }

    let mut journey = match &args.journey {
        Some(shared) => Journey::from_shared(shared, config.default_topic.clone()),
        None => Journey::new(config.default_topic.clone()),
    };
    if let Some(topic) = &args.topic {
        journey.navigate(topic);
    }

    let service = Arc::new(GatewayContentService::from_config(&config)?);
    let shell = AppShell::new(service, config, journey);
    let mut events = shell.orchestrator().subscribe();

    let status = with_live_definition(&mut events, shell.boot()).await;
    if let ShellStatus::ConfigError(message) = status {
        print_config_error(&message);
        anyhow::bail!("startup validation failed");
    }

    if let Some(language) = &args.lang {
        if !shell.translate(language).await {
            eprintln!("⚠️ Translation to '{}' was not started", language);
        }
    }
    print_panels(&shell);

    if args.interactive {
        interact(&shell, &mut events).await?;
    }
    Ok(())
}

/// Run `action` while printing definition fragments as they arrive.
async fn with_live_definition<F: Future>(
    events: &mut broadcast::Receiver<ViewEvent>,
    action: F,
) -> F::Output {
    tokio::pin!(action);
    let mut printer = DefinitionPrinter::default();

    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => printer.handle(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Renderer lagged behind view events");
                }
                Err(RecvError::Closed) => return action.await,
            },
            output = &mut action => {
                loop {
                    match events.try_recv() {
                        Ok(event) => printer.handle(&event),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                printer.finish();
                return output;
            }
        }
    }
}

/// Prints only the new suffix of each accumulated definition.
#[derive(Default)]
struct DefinitionPrinter {
    printed: usize,
    open: bool,
}

impl DefinitionPrinter {
    fn handle(&mut self, event: &ViewEvent) {
        match event.kind {
            ViewEventKind::TransitionStarted => {
                self.finish();
                println!("\n━━━ {} ━━━", event.topic);
                self.printed = 0;
                self.open = true;
            }
            ViewEventKind::DefinitionUpdated => {
                let Some(text) = event.data.as_ref().and_then(|d| d.as_str()) else {
                    return;
                };
                if text.len() > self.printed && text.is_char_boundary(self.printed) {
                    print!("{}", &text[self.printed..]);
                    let _ = std::io::stdout().flush();
                    self.printed = text.len();
                }
            }
            ViewEventKind::DefinitionFailed => {
                self.finish();
                if let Some(message) = event.data.as_ref().and_then(|d| d.as_str()) {
                    eprintln!("❌ {}", message);
                }
            }
            _ => {}
        }
    }

    fn finish(&mut self) {
        if self.open {
            println!();
            self.open = false;
        }
    }
}

fn print_config_error(message: &str) {
    eprintln!("╔══════════════════════════════════════╗");
    eprintln!("║        CONFIGURATION ERROR           ║");
    eprintln!("╚══════════════════════════════════════╝");
    eprintln!("{}", message);
}

fn print_panels(shell: &AppShell) {
    let orchestrator = shell.orchestrator();
    let view = orchestrator.view();

    if let Some(translation) = &view.translation {
        println!("\n[{}] {}", translation.language, translation.text);
    }
    if let Some(message) = view.error(Feature::Translation) {
        println!("\n⚠️ {}", message);
    }

    print_art(&view);

    match (&view.related, view.error(Feature::Related)) {
        (Some(topics), _) => {
            println!("\nRelated:");
            for (i, topic) in topics.iter().enumerate() {
                println!("  {}. {}", i + 1, topic);
            }
        }
        (None, Some(message)) => println!("\n⚠️ {}", message),
        (None, None) => {}
    }

    match (&view.fact, view.error(Feature::Fact)) {
        (Some(HistoricalFact::Fact(fact)), _) => println!("\nDid you know? {}", fact),
        (Some(HistoricalFact::NoneKnown), _) => {}
        (None, Some(message)) => println!("\n⚠️ {}", message),
        (None, None) => {}
    }

    if let Some(rating) = &view.difficulty {
        println!("\nDifficulty: {:?} ({})", rating.level, rating.reason);
    }

    let journey = orchestrator.journey();
    let trail: Vec<String> = journey
        .topics()
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            if i == journey.index() {
                format!("[{}]", topic)
            } else {
                topic.clone()
            }
        })
        .collect();
    println!("\nJourney: {}", trail.join(" → "));
    println!("Share:   --journey '{}'", journey.to_shared());
}

fn print_art(view: &ViewState) {
    match (&view.art, view.error(Feature::Art)) {
        (Some(art), _) => println!("\n{}", art),
        (None, Some(message)) => println!("\n⚠️ {}", message),
        (None, None) => {}
    }

    match (&view.animation, view.error(Feature::Animation)) {
        (Some(frames), _) => {
            for (i, frame) in frames.iter().enumerate() {
                println!("\n-- frame {}/{} --\n{}", i + 1, frames.len(), frame);
            }
        }
        (None, Some(message)) => println!("\n⚠️ {}", message),
        (None, None) => {}
    }
}

/// One parsed stdin line
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Pick a related topic by its 1-based number
    Related(usize),
    /// Jump to a 1-based journey position
    Jump(usize),
    Translate(String),
    Topic(String),
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head {
            ":q" | ":quit" => Command::Quit,
            ":h" | ":help" => Command::Help,
            ":j" | ":jump" => Command::Jump(rest.parse().ok()?),
            ":l" | ":lang" if rest.is_empty() => return None,
            ":l" | ":lang" => Command::Translate(rest.to_string()),
            _ => match line.parse::<usize>() {
                Ok(n) => Command::Related(n),
                Err(_) => Command::Topic(line.to_string()),
            },
        };
        Some(command)
    }
}

const HELP: &str = "  <topic>      explore a new topic\n  <n>          open related topic n\n  :jump <n>    return to journey position n\n  :lang <code> translate the definition\n  :quit        leave";

async fn interact(
    shell: &AppShell,
    events: &mut broadcast::Receiver<ViewEvent>,
) -> anyhow::Result<()> {
    println!("\nType a topic, a related-topic number, or :help");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        let acted = match command {
            Command::Quit => return Ok(()),
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Related(n) => {
                let related = shell.orchestrator().view().related.unwrap_or_default();
                match n.checked_sub(1).and_then(|i| related.get(i)) {
                    Some(topic) => with_live_definition(events, shell.go_to(topic)).await,
                    None => {
                        println!("No related topic {}", n);
                        continue;
                    }
                }
            }
            Command::Jump(n) => match n.checked_sub(1) {
                Some(index) => with_live_definition(events, shell.jump_to(index)).await,
                None => false,
            },
            Command::Translate(language) => shell.translate(&language).await,
            Command::Topic(topic) => with_live_definition(events, shell.go_to(&topic)).await,
        };

        if acted {
            print_panels(shell);
        } else {
            println!("Nothing to do");
        }
    }
}
