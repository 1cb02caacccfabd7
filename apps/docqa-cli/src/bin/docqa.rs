use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa_cli::{Command, InteractiveController, UiUpdate};
use docqa_core::config::expand_path;
use docqa_core::{Config, Lane};
use docqa_extract::default_source;
use docqa_model::load_model;
use docqa_tasks::TaskSupervisor;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.model_settings()?;

    println!("📚 Document Q&A");
    println!("===============");
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Loading model...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let model = match load_model(&settings) {
        Ok(model) => model,
        Err(e) => {
            spinner.finish_and_clear();
            eprintln!("❌ Failed to load model: {:#}", e);
            eprintln!("   Set APP_MODEL_DIR to a Llama checkpoint, or APP_USE_FAKE_MODEL=1 to try the loop without one.");
            return Err(e);
        }
    };
    spinner.finish_with_message("✅ Model ready");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let mut supervisor = TaskSupervisor::new(runtime.handle().clone(), default_source(), model);
    let mut controller = InteractiveController::new();
    let initial = env::args().nth(1).map(expand_path);

    let outcome = runtime.block_on(interactive_loop(&mut supervisor, &mut controller, initial));
    // Superseded workers may still be blocked inside the model; don't wait for them.
    runtime.shutdown_background();
    outcome
}

async fn interactive_loop(
    supervisor: &mut TaskSupervisor,
    controller: &mut InteractiveController,
    initial: Option<PathBuf>,
) -> anyhow::Result<()> {
    show_help();
    let mut view = View::default();
    if let Some(path) = initial {
        controller.load_document(supervisor, path);
    }
    view.render(controller);
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    None => {}
                    Some(Command::Quit) => {
                        view.clear();
                        println!("👋 Goodbye!");
                        break;
                    }
                    Some(Command::Help) => show_help(),
                    Some(Command::Status) => show_status(controller, supervisor),
                    Some(Command::Load(path)) => {
                        controller.load_document(supervisor, expand_path(path.to_string_lossy()));
                    }
                    Some(Command::Ask(question)) => {
                        if let Err(e) = controller.ask(supervisor, &question) {
                            debug!("question rejected: {}", e);
                        }
                    }
                    Some(Command::Usage(usage)) => println!("Usage: {}", usage),
                    Some(Command::Unknown(cmd)) => println!("❓ Unknown command {} (try /help)", cmd),
                }
                view.render(controller);
                prompt()?;
            }
            Some(envelope) = supervisor.recv() => {
                if supervisor.deliver(envelope, controller) {
                    view.render(controller);
                }
            }
        }
    }
    Ok(())
}

fn prompt() -> io::Result<()> {
    print!("docqa> ");
    io::stdout().flush()
}

fn show_help() {
    println!("🎯 Commands:");
    if cfg!(feature = "pdf") {
        println!("  /load <path>  - Load a PDF or text document");
    } else {
        println!("  /load <path>  - Load a text document (PDF needs the `pdf` feature)");
    }
    println!("  /ask <text>   - Ask about the loaded document (or just type the question)");
    println!("  /status       - Show what is loaded and running");
    println!("  /help         - Show this help message");
    println!("  /quit         - Exit");
    println!();
}

fn show_status(controller: &InteractiveController, supervisor: &TaskSupervisor) {
    match (controller.document_path(), controller.document()) {
        (Some(path), Some(text)) => println!("📄 {} ({} chars)", path.display(), text.chars().count()),
        (None, Some(text)) => println!("📄 ({} chars)", text.chars().count()),
        _ => println!("📄 No document loaded"),
    }
    for lane in [Lane::Extraction, Lane::Inference] {
        match supervisor.current(lane) {
            Some(job) => println!("⚙️  {}: {} {:?} ({})", lane, job.id, job.state, job.subject),
            None => println!("⚙️  {}: idle", lane),
        }
    }
    println!("ℹ️  {}", controller.status());
}

/// Terminal rendering of controller updates. The progress bar exists only
/// while an extraction is in flight.
#[derive(Default)]
struct View {
    bar: Option<ProgressBar>,
}

impl View {
    fn render(&mut self, controller: &mut InteractiveController) {
        let loading = controller.progress().is_some();
        for update in controller.drain_updates() {
            match update {
                UiUpdate::Progress(fraction) => {
                    let bar = self.bar.get_or_insert_with(progress_bar);
                    bar.set_position((fraction * 100.0).round() as u64);
                }
                UiUpdate::Answer(answer) => self.say(&format!("\n💬 {}\n", answer)),
                UiUpdate::Status(status) => match &self.bar {
                    Some(bar) if loading => bar.set_message(status),
                    _ => {
                        self.clear();
                        println!("ℹ️  {}", status);
                    }
                },
            }
        }
        if !loading { self.clear(); }
    }

    fn say(&self, text: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| println!("{}", text)),
            None => println!("{}", text),
        }
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() { bar.finish_and_clear(); }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}
