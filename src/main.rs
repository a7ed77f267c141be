use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use finance_guide::api::HttpBackend;
use finance_guide::config::ClientConfig;
use finance_guide::navigation::{NavigationTarget, Navigator, ReplaySignal};
use finance_guide::onboarding::{
    ControllerSettings, ConversationController, ConversationView, OptionAction, Sender,
    TurnOutcome, UploadFile,
};
use finance_guide::tours::{
    AnchorSet, CompletionStore, JsonFileCache, TourEngine, TourEvent, TourId, TourMount,
    TourRegistry,
};

/// Forwards navigation requests to the main loop.
struct ChannelNavigator {
    tx: mpsc::UnboundedSender<NavigationTarget>,
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, target: NavigationTarget) {
        let _ = self.tx.send(target);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env().context("reading FINANCE_* configuration")?;

    eprintln!("💰 Finance Guide v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: {}", config.api_base_url);
    eprintln!("   Locale: {}", config.locale);
    eprintln!("   Tour cache: {}", config.tour_cache_path.display());
    eprintln!("   Type a message, or /help for commands.\n");

    let backend = Arc::new(HttpBackend::new(&config)?);
    let (nav_tx, mut nav_rx) = mpsc::unbounded_channel();
    let navigator = Arc::new(ChannelNavigator { tx: nav_tx });

    // ── Tours ───────────────────────────────────────────────────────────
    let registry = TourRegistry::builtin();
    // A terminal has no layout to hide anchors, so every step is present.
    let anchors = Arc::new(AnchorSet::with_anchors(
        registry
            .ids()
            .filter_map(|id| registry.get(id))
            .flatten()
            .map(|step| step.target_id.clone())
            .collect::<Vec<_>>(),
    ));
    let store = CompletionStore::new(
        Arc::new(JsonFileCache::new(&config.tour_cache_path)),
        backend.clone(),
    );
    store.spawn_load();
    let engine = TourEngine::new(registry, anchors, store);
    let mut tour_events = engine.subscribe();
    let replay = ReplaySignal::new();
    let mut mount = TourMount::new(engine.clone(), config.timings);

    // ── Onboarding ──────────────────────────────────────────────────────
    let controller = ConversationController::new(
        backend.clone(),
        navigator,
        ControllerSettings::from(&config),
    );
    controller.bootstrap().await;
    let mut shown = render(&controller.view().await, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    eprint!("> ");
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                handle_command(&line, &controller, &engine, &replay, &mut mount).await;
                shown = render(&controller.view().await, shown);
                eprint!("> ");
            }
            Some(target) = nav_rx.recv() => {
                match target {
                    NavigationTarget::Route(route) => {
                        println!("\n→ Onboarding concluído, abrindo {route}\n");
                        mount.render(TourId::Welcome, true, &replay);
                    }
                    NavigationTarget::External(url) => {
                        println!("\nAbra este endereço para autorizar o Google Drive:\n  {url}");
                        println!("Depois cole o código com /code <código>\n");
                    }
                }
                eprint!("> ");
            }
            Ok(event) = tour_events.recv() => {
                print_tour_event(&engine, event).await;
                eprint!("> ");
            }
        }
    }

    controller.shutdown();
    Ok(())
}

async fn handle_command(
    line: &str,
    controller: &ConversationController,
    engine: &Arc<TourEngine>,
    replay: &ReplaySignal,
    mount: &mut TourMount,
) {
    let (command, arg) = match line.split_once(' ') {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    let outcome = match command {
        "/help" => {
            print_help();
            return;
        }
        "/upload" => match read_upload(arg).await {
            Ok(file) => controller.upload_file(file).await,
            Err(e) => {
                eprintln!("Cannot read {arg}: {e}");
                return;
            }
        },
        "/google" => controller.start_external_auth().await,
        "/code" => controller.submit_external_auth_code(arg).await,
        "/option" => {
            let view = controller.view().await;
            let picked = arg
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| view.options.get(i).cloned());
            let Some(option) = picked else {
                eprintln!("No such option: {arg}");
                return;
            };
            match option.action {
                OptionAction::OpenFilePicker => {
                    eprintln!("Use /upload <path> to send your spreadsheet.");
                    return;
                }
                OptionAction::StartExternalAuth => controller.start_external_auth().await,
                OptionAction::SendMessage(text) => controller.send_message(&text).await,
            }
        }
        "/files" => {
            controller.dismiss_google_files().await;
            return;
        }
        "/tour" | "/replay" => {
            match arg.parse::<TourId>() {
                Ok(id) if command == "/replay" => {
                    replay.request(id);
                    mount.render(id, true, replay);
                }
                Ok(id) => {
                    if !engine.start(id, false).await {
                        eprintln!("Tour {id} not started (already seen? try /replay {id})");
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
            return;
        }
        "/next" => {
            engine.next().await;
            return;
        }
        "/prev" => {
            engine.prev().await;
            return;
        }
        "/close" => {
            engine.dismiss().await;
            return;
        }
        "/tours" => {
            let seen: Vec<_> = engine.store().snapshot().into_iter().map(|id| id.to_string()).collect();
            println!("Seen tours: {}", if seen.is_empty() { "none".to_string() } else { seen.join(", ") });
            return;
        }
        "/reset" => {
            engine.reset();
            println!("All tours will play again.");
            return;
        }
        _ if command.starts_with('/') => {
            eprintln!("Unknown command {command}. /help lists commands.");
            return;
        }
        _ => controller.send_message(line).await,
    };

    match outcome {
        TurnOutcome::Busy => eprintln!("Still waiting for the previous reply."),
        TurnOutcome::Rejected => eprintln!("Nothing to send."),
        _ => {}
    }
}

async fn read_upload(path: &str) -> std::io::Result<UploadFile> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    let content_type = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("csv") => Some("text/csv"),
        Some("xlsx") => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        Some("pdf") => Some("application/pdf"),
        Some("ofx") => Some("application/x-ofx"),
        _ => None,
    };
    let file = UploadFile::new(file_name, bytes);
    Ok(match content_type {
        Some(ct) => file.with_content_type(ct),
        None => file,
    })
}

/// Print messages appended since `shown`, then the current options.
fn render(view: &ConversationView, shown: usize) -> usize {
    for message in view.messages.iter().skip(shown) {
        match message.sender {
            Sender::Agent => println!("\n🤖 {}", message.text),
            Sender::User => println!("\n🙂 {}", message.text),
        }
    }
    if let Some(files) = &view.google_files {
        println!("\nArquivos no Google Drive:");
        for file in files {
            println!("  • {} ({})", file.name, file.url);
        }
        println!("  (/files para fechar)");
    }
    if !view.options.is_empty() && view.messages.len() > shown {
        println!();
        for (i, option) in view.options.iter().enumerate() {
            println!("  [{}] {}", i + 1, option.label);
        }
        println!("  (/option <n> para escolher)");
    }
    println!("  progresso: {}%", view.progress_percent);
    view.messages.len()
}

async fn print_tour_event(engine: &TourEngine, event: TourEvent) {
    match event {
        TourEvent::Started { .. } | TourEvent::StepChanged { .. } => {
            if let Some(view) = engine.current().await {
                println!(
                    "\n🧭 [{}/{}] {}: {}\n   ({} · /next /prev /close)",
                    view.index + 1,
                    view.total,
                    view.step.title,
                    view.step.body,
                    view.step.target_id,
                );
            }
        }
        TourEvent::Completed { tour_id } => println!("\n🧭 Tour {tour_id} concluído."),
        TourEvent::Dismissed { tour_id, .. } => println!("\n🧭 Tour {tour_id} fechado."),
    }
}

fn print_help() {
    println!(
        "\
Commands:
  <text>            send a chat message
  /option <n>       pick option n
  /upload <path>    upload a spreadsheet or statement
  /google           connect Google Drive
  /code <code>      finish Google authorization
  /files            close the Google file list
  /tour <id>        start a tour (welcome, transactions, budgets, reports, assistant)
  /replay <id>      replay a tour even if already seen
  /next /prev       move through the active tour
  /close            close the active tour
  /tours            list seen tours
  /reset            forget seen tours
  /quit             exit"
    );
}
