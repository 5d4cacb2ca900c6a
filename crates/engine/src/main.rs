//! Emberglen Engine - console village.

use emberglen_engine::api::console::{parse_command, ConsoleCommand, ConsoleUi, HELP};
use emberglen_engine::api::{ChatPresenter, UiEvent};
use emberglen_engine::infrastructure::ports::UiPort;
use emberglen_engine::infrastructure::settings::EngineSettings;
use emberglen_engine::App;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (works when run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Logs go to stderr so they do not interleave with the chat on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "emberglen_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Emberglen Engine");

    let settings = EngineSettings::from_env();
    let app = App::from_settings(&settings).await?;
    let mut presenter = app.into_presenter(ConsoleUi::new(std::io::stdout()));

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut presenter, &line).await {
                    break;
                }
            }
            alive = presenter.pump() => {
                if !alive {
                    break;
                }
            }
        }
    }

    // Let pending replies land before leaving
    presenter.settle().await;
    tracing::info!("Engine stopped");
    Ok(())
}

/// Returns `false` when the player asked to quit.
async fn handle_line<U: UiPort>(presenter: &mut ChatPresenter<U>, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    match parse_command(line, presenter.village().npcs()) {
        ConsoleCommand::Quit => return false,
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Invalid(msg) => println!("{msg}"),
        ConsoleCommand::Where => {
            let village = presenter.village();
            let me = village.player().position();
            println!("You stand at ({:.0}, {:.0}).", me.x, me.y);
            for npc in village.npcs().iter() {
                let reach = if village.in_range(npc.id) { "within reach" } else { "too far" };
                println!(
                    "  {} at ({:.0}, {:.0}), {:.0} away, {}",
                    npc.name,
                    npc.position.x,
                    npc.position.y,
                    me.distance_to(&npc.position),
                    reach
                );
            }
        }
        ConsoleCommand::Ui(event) => presenter.dispatch(event).await,
        ConsoleCommand::Say(text) => {
            let open = presenter.village().dialogue().open_npc().await;
            match open {
                Some(npc_id) => presenter.dispatch(UiEvent::Submit { npc_id, text }).await,
                None => println!("Nobody is listening. Walk up to someone and `talk <name>`."),
            }
        }
    }
    true
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
