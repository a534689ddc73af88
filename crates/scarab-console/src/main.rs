//! Interactive console rendition of the experiment product page.
//!
//! Simulates one page open of the ChargeMax product page: the scarcity
//! message, countdown, gallery, content sections, and the add-to-cart /
//! continue flow, with full telemetry through the configured collector.
//!
//! Usage: `scarab-console "[pageUrl?]pid=<id>[&condition=<c>]"`

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use scarab_core::config::PageConfig;
use scarab_core::content::ContentKind;
use scarab_core::countdown::Urgency;
use scarab_core::message::{EXPIRED_MESSAGE, ScarcityMessage, ScarcityTone};
use scarab_core::platform::ClientEnvironment;
use scarab_core::query::PageRequest;
use scarab_runtime::{CartControlState, PageCatalog, PageController, PageView};
use scarab_telemetry::TelemetryDispatcher;

/// Terminal rendering of the page affordances.
struct ConsoleView;

impl PageView for ConsoleView {
    fn render_scarcity(&self, message: &ScarcityMessage) {
        let line = match message.tone {
            ScarcityTone::Standard => message.text.green(),
            ScarcityTone::QuantityLimited => message.text.yellow().bold(),
            ScarcityTone::TimeLimited => message.text.red().bold(),
        };
        println!("{line}");
    }

    fn render_scarcity_expired(&self) {
        println!("{}", EXPIRED_MESSAGE.red().bold());
    }

    fn render_countdown(&self, display: &str, urgency: Urgency) {
        let line = format!("offer ends in {display}");
        match urgency {
            Urgency::Normal => println!("{}", line.dimmed()),
            Urgency::Urgent => println!("{}", line.yellow()),
            Urgency::Critical => println!("{}", line.red().bold()),
        }
    }

    fn set_cart_state(&self, state: CartControlState) {
        match state {
            CartControlState::Enabled => println!("{}", "[ Add to Cart ]".cyan()),
            CartControlState::Disabled => println!("{}", "[ Add to Cart ] (disabled)".dimmed()),
            CartControlState::Converted => println!("{}", "[ ✓ Added to Cart ]".green()),
        }
    }

    fn reveal_continue(&self) {
        println!("{}", "[ Continue to Survey ] is now available".green().bold());
    }

    fn render_gallery(&self, current: usize, image_count: usize) {
        println!(
            "{}",
            format!("(gallery: image {}/{image_count})", current + 1).dimmed()
        );
    }

    fn notify(&self, message: &str) {
        println!("{}", message.bold());
    }
}

/// CLI helper for rustyline that provides completion and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: [
                "help", "status", "cart", "continue", "details", "faq", "gallery", "focus",
                "quit",
            ]
            .iter()
            .map(|command| command.to_string())
            .collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let candidates: Vec<Pair> = self
            .commands
            .iter()
            .filter(|command| command.starts_with(line))
            .map(|command| Pair {
                display: command.clone(),
                replacement: command.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if line.is_empty() || pos < line.len() {
            return None;
        }
        self.commands
            .iter()
            .find(|command| command.starts_with(line) && command.len() > line.len())
            .map(|command| command[line.len()..].to_string())
    }
}

impl Highlighter for CliHelper {}

impl Validator for CliHelper {}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PageConfig::load()?;
    let request = PageRequest::parse(&std::env::args().nth(1).unwrap_or_default());
    let telemetry = TelemetryDispatcher::from_config(&config);
    let catalog = PageCatalog::default();

    print_page_header(&catalog);

    let controller = PageController::open(
        config,
        catalog,
        request,
        ClientEnvironment::default(),
        telemetry,
        ConsoleView,
    )
    .await?;

    println!();
    println!("{}", "type `help` for commands".dimmed());

    // rustyline blocks, so a plain thread owns the editor and feeds lines
    // into the async loop.
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    std::thread::spawn(move || {
        let mut editor = match Editor::<CliHelper, DefaultHistory>::new() {
            Ok(editor) => editor,
            Err(err) => {
                eprintln!("could not start line editor: {err}");
                return;
            }
        };
        editor.set_helper(Some(CliHelper::new()));
        loop {
            match editor.readline("page> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    let _ = line_tx.send("quit".to_string());
                    break;
                }
                Err(err) => {
                    eprintln!("readline error: {err}");
                    let _ = line_tx.send("quit".to_string());
                    break;
                }
            }
        }
    });

    while let Some(line) = line_rx.recv().await {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else { continue };
        match command {
            "help" => print_help(),
            "status" => print_status(&controller).await,
            "cart" => controller.add_to_cart().await,
            "continue" => match controller.continue_to_survey().await {
                Ok(Some(url)) => {
                    println!("{} {url}", "Redirecting to:".green().bold());
                    controller.unload().await;
                    break;
                }
                Ok(None) => {
                    println!("{}", "Continue is not available yet.".dimmed());
                }
                Err(err) => {
                    // SurveyUrlMissing was already shown through the view;
                    // anything else only concerns the operator.
                    if !err.is_user_visible() {
                        tracing::error!("continue failed: {err}");
                    }
                }
            },
            "details" => match parse_index(parts.next()) {
                Some(index) => {
                    controller
                        .toggle_section(ContentKind::ProductDetails, index)
                        .await;
                }
                None => println!("usage: details <index>"),
            },
            "faq" => match parse_index(parts.next()) {
                Some(index) => controller.toggle_section(ContentKind::Faq, index).await,
                None => println!("usage: faq <index>"),
            },
            "gallery" => match parts.next() {
                Some("next") => controller.next_image().await,
                Some("prev") => controller.prev_image().await,
                Some(raw) => match raw.parse::<isize>() {
                    Ok(index) => controller.select_image(index).await,
                    Err(_) => println!("usage: gallery next|prev|<index>"),
                },
                None => println!("usage: gallery next|prev|<index>"),
            },
            "focus" => controller.product_details_focus().await,
            "quit" | "exit" => {
                controller.unload().await;
                break;
            }
            other => println!("unknown command: {other} (try `help`)"),
        }
    }

    Ok(())
}

fn parse_index(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.parse::<usize>().ok())
}

fn print_page_header(catalog: &PageCatalog) {
    println!("{}", "ChargeMax Pro — Wireless Charging Stand".bold());
    println!("{}", "─".repeat(44).dimmed());
    for (index, title) in catalog.product_detail_titles.iter().enumerate() {
        println!("  details {index}: {title}");
    }
    for (index, title) in catalog.faq_titles.iter().enumerate() {
        println!("  faq {index}: {title}");
    }
    println!("  gallery: {} images", catalog.image_count);
    println!("{}", "─".repeat(44).dimmed());
}

fn print_help() {
    println!("commands:");
    println!("  status              show session state");
    println!("  cart                add the product to the cart");
    println!("  continue            continue to the post survey");
    println!("  details <n>         toggle a product details section");
    println!("  faq <n>             toggle an FAQ entry");
    println!("  gallery next|prev|<n>  navigate the image gallery");
    println!("  focus               hover the product details region");
    println!("  quit                leave the page");
}

async fn print_status(controller: &Arc<PageController<ConsoleView>>) {
    let session = controller.session_snapshot().await;
    let content = controller.content_snapshot().await;
    let gallery = controller.gallery_snapshot().await;

    println!("  pid:          {}", session.participant_id());
    println!("  platform:     {}", session.platform());
    println!(
        "  condition:    {} ({})",
        session.condition(),
        session.assignment()
    );
    println!("  phase:        {}", session.phase());
    println!("  cart:         {}", session.cart_status());
    println!("  continue:     {}", if session.continue_enabled() { "enabled" } else { "locked" });
    println!("  time on page: {}s", session.time_on_page_secs());
    println!("  interactions: {}", session.interaction_count());
    println!("  gallery:      image {}/{}", gallery.current() + 1, gallery.image_count());
    for (title, open) in content.product_details.items() {
        if open {
            println!("  open section: {title}");
        }
    }
    for (title, open) in content.faq.items() {
        if open {
            println!("  open faq:     {title}");
        }
    }
}
