//! Connect to an SSE endpoint and print every event until Ctrl-C
//!
//! Run with: cargo run --example reqwest --features reqwest -- <url> [last-event-id]

use sse_session::{Session, SessionConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sse_session=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "http://localhost:8080/events".to_owned());

    let mut config = SessionConfig::new(url);
    if let Some(id) = args.next() {
        config = config.last_event_id(id);
    }

    let mut session = Session::connect_reqwest(config).await?;

    let close = session.close_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            close.close();
        }
    });

    while let Some(event) = session.next_event().await? {
        println!("Event type: {}", event.event);
        println!("Data: {}", event.data);
        if let Some(id) = &event.id {
            println!("ID: {id}");
        }
        if let Some(retry) = event.retry {
            println!("Retry: {retry:?}");
        }
        println!("---");
    }

    println!("Closed, resume with last event id {:?}", session.last_event_id());
    Ok(())
}
