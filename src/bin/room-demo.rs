//! Room Demo CLI Tool
//!
//! Command-line tool that drives a full session lifecycle against the
//! in-process core: sign-in, matchmaking, chat with responder replies,
//! and session end.
//!
//! Usage:
//!   cargo run --bin room-demo -- --help
//!   cargo run --bin room-demo -- --role Engineer --messages 3
//!   cargo run --bin room-demo -- --role Designer --seed 42 --search-delay-ms 200

use anyhow::Result;
use clap::Parser;
use huddle_room::chat::CannedResponses;
use huddle_room::config::AppConfig;
use huddle_room::directory::{StaticCandidateDirectory, StaticIdentityProvider};
use huddle_room::events::LoggingEventPublisher;
use huddle_room::metrics::MetricsCollector;
use huddle_room::scheduler::{RandomSource, SeededRandomSource, ThreadRandomSource};
use huddle_room::session::SessionContext;
use huddle_room::types::{MessageKind, UserProfile};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Parser)]
#[command(name = "room-demo")]
#[command(about = "Scripted session lifecycle demo for the huddle-room core")]
struct Cli {
    /// Role to search with (Engineer, Designer, Product Manager)
    #[arg(short, long, default_value = "Engineer")]
    role: String,

    /// Number of chat messages to send
    #[arg(short, long, default_value = "3")]
    messages: usize,

    /// RNG seed for reproducible leader election and reply delays
    #[arg(short, long)]
    seed: Option<u64>,

    /// Matchmaking search delay override in milliseconds
    #[arg(long, default_value = "1000")]
    search_delay_ms: u64,

    /// Leave instead of ending the session (no history record)
    #[arg(long)]
    leave: bool,
}

fn demo_profile(role: &str) -> UserProfile {
    UserProfile {
        id: "demo-user".to_string(),
        username: "demo.user".to_string(),
        name: "Demo User".to_string(),
        role: role.to_string(),
        skills: BTreeSet::new(),
        avatar: "https://api.dicebear.com/7.x/avataaars/svg?seed=demo.user".to_string(),
        is_automated: false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::default();
    config.matchmaking.search_delay_ms = cli.search_delay_ms;
    config.chat.responder_min_delay_ms = 300;
    config.chat.responder_max_delay_ms = 800;

    let rng: Arc<dyn RandomSource> = match cli.seed {
        Some(seed) => Arc::new(SeededRandomSource::new(seed)),
        None => Arc::new(ThreadRandomSource),
    };

    let identity = Arc::new(StaticIdentityProvider::signed_in(demo_profile(&cli.role)));
    let context = SessionContext::with_components(
        config,
        identity,
        Arc::new(StaticCandidateDirectory::with_sample_users()),
        Arc::new(LoggingEventPublisher::new()),
        Arc::new(CannedResponses::new(rng.clone())),
        rng,
        Arc::new(MetricsCollector::new()?),
    );

    println!("🔍 Searching for teammates as '{}'...", cli.role);
    context.start_search().await?;

    while context.active_session()?.is_none() {
        sleep(Duration::from_millis(50)).await;
    }

    let session = context.active_session()?.expect("session just formed");
    println!("🤝 Session {} formed:", session.id);
    for member in &session.members {
        let marker = if member.id == session.leader_id {
            " (leader)"
        } else if member.is_automated {
            " (helper)"
        } else {
            ""
        };
        println!("   - {}{}", member.name, marker);
    }

    for i in 1..=cli.messages {
        let text = format!("Status update #{} from {}", i, cli.role);
        context.post_user_message(&text).await?;
        sleep(Duration::from_millis(1000)).await;
    }

    println!("💬 Message log:");
    for message in context.messages()? {
        match message.kind {
            MessageKind::System => println!("   [system] {}", message.text),
            MessageKind::User => println!(
                "   [{}] {}",
                message.sender_name.as_deref().unwrap_or("?"),
                message.text
            ),
        }
    }

    if cli.leave {
        context.leave_session().await?;
        println!("🚪 Left the session (no history record)");
    } else if session.is_leader("demo-user") {
        let ended = context.end_session().await?;
        println!(
            "🏁 Session ended at {}",
            ended.ended_at.expect("ended session carries a timestamp")
        );
    } else {
        context.leave_session().await?;
        println!("🚪 Not the leader, left the session instead");
    }

    println!(
        "📜 History now holds {} session(s)",
        context.history()?.len()
    );

    Ok(())
}
