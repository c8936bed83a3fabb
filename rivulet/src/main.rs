#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc;

use args::Args;
use clap::Parser;
use rivulet_config::Config;
use rivulet_llm::ChatError;
use rivulet_llm::protocol::ChatRequest;
use rivulet_llm::transport::{ChatTransport, HttpTransport};
use rivulet_llm::types::Message;
use rivulet_stream::{ChatHooks, SessionTiming, StreamSession, ToolRegistry};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    init_tracing();

    tracing::info!(
        config_path = %args.config.display(),
        "starting rivulet"
    );

    let transport = Arc::new(HttpTransport::new(&config.provider));
    let request = build_request(&config, &args);

    if args.no_stream {
        let answer = transport.complete(&request).await?;
        println!("{answer}");
        return Ok(());
    }

    // Ctrl+C aborts the session; committed text is still flushed
    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel_on_signal.cancel();
    });

    let (failures, failed) = mpsc::channel();
    let hooks = printing_hooks(args.show_thinking, failures);

    let timing = SessionTiming::from(&config.stream);
    let session = StreamSession::new(transport, request, ToolRegistry::new(), hooks, timing, cancel);
    let outcome = session.run().await;

    tracing::debug!(state = ?outcome.state, "session ended");

    if let Ok(err) = failed.try_recv() {
        return Err(err.into());
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn build_request(config: &Config, args: &Args) -> ChatRequest {
    let mut messages = Vec::new();
    if let Some(system) = &args.system {
        messages.push(Message::system(system));
    }
    messages.push(Message::user(&args.prompt));

    ChatRequest {
        model: args.model.clone().unwrap_or_else(|| config.provider.model.clone()),
        messages,
        temperature: config.chat.temperature,
        top_p: config.chat.top_p,
        presence_penalty: config.chat.presence_penalty,
        frequency_penalty: config.chat.frequency_penalty,
        stream: Some(true),
        tools: None,
    }
}

/// Hooks that stream the answer to stdout and the side channels to stderr
fn printing_hooks(show_thinking: bool, failures: mpsc::Sender<ChatError>) -> ChatHooks {
    let thinking: Option<rivulet_stream::UpdateFn> = show_thinking.then(|| {
        Box::new(|_committed: &str, fragment: &str| {
            eprint!("{fragment}");
            let _ = std::io::stderr().flush();
        }) as rivulet_stream::UpdateFn
    });

    ChatHooks {
        on_update: Some(Box::new(|_committed, fragment| {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        })),
        on_update_thinking: thinking,
        on_update_search: Some(Box::new(|_committed, fragment| {
            eprint!("{fragment}");
            let _ = std::io::stderr().flush();
        })),
        on_finish: Some(Box::new(|_text, _meta| {
            println!();
        })),
        on_error: Some(Box::new(move |err| {
            let _ = failures.send(err);
        })),
        ..ChatHooks::default()
    }
}

/// Wait for a shutdown signal (`SIGINT` or `SIGTERM`)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
}
