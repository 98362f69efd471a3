//! Command-line controller for an inkboard display.
//!
//! Joins a display through the relay the same way a phone controller does,
//! so a running board can be inspected (`watch`) or drawn on from a file
//! (`replay`) without a browser.


use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use frames::session::{SessionCode, SessionCodeError};
use frames::throttle::{MOVE_INTERVAL_MS, MoveThrottle};
use frames::{
    BoardSnapshot, InputEvent, Message, RelayNotice, Stroke, ToolState, decode_message, decode_notice, encode_message,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const DISPLAY_WAIT: Duration = Duration::from_secs(5);

type PeerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid session code: {0}")]
    Code(#[from] SessionCodeError),
    #[error("invalid relay URL: {0}")]
    InvalidRelayUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay health check returned HTTP {0}")]
    Unhealthy(u16),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("relay rejected the connection: {0}")]
    Rejected(String),
    #[error("timed out waiting for the display")]
    Timeout,
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("invalid stroke file: {0}")]
    StrokeFile(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(err))
    }
}

#[derive(Parser, Debug)]
#[command(name = "inkboard-cli", about = "Inkboard session and controller CLI")]
struct Cli {
    #[arg(long, env = "INKBOARD_RELAY_URL", default_value = "ws://127.0.0.1:3000")]
    relay_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the relay answers its health probe.
    Ping,
    /// Print a fresh session code and the peer identity it maps to.
    Code,
    /// Join a display as controller and print every message it sends.
    Watch(WatchArgs),
    /// Draw the strokes in a JSON file onto a display.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long)]
    code: String,
    /// Stop after this many board messages.
    #[arg(long)]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    #[arg(long)]
    code: String,
    /// A page record (`{"strokes": [...]}`) or a bare stroke array.
    #[arg(long)]
    file: String,
    /// Spacing between `move` samples in milliseconds.
    #[arg(long, default_value_t = MOVE_INTERVAL_MS)]
    interval_ms: f64,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Ping => ping(&cli.relay_url).await,
        Command::Code => {
            let code = SessionCode::generate();
            println!("code:     {}", code.as_str());
            println!("identity: {}", code.peer_identity());
            Ok(())
        }
        Command::Watch(args) => watch(&cli.relay_url, args).await,
        Command::Replay(args) => replay(&cli.relay_url, args).await,
    }
}

// =============================================================================
// URLS
// =============================================================================

fn relay_base(relay_url: &str) -> Result<&str, CliError> {
    let base = relay_url.trim_end_matches('/');
    if base.starts_with("ws://") || base.starts_with("wss://") {
        Ok(base)
    } else {
        Err(CliError::InvalidRelayUrl(relay_url.to_owned()))
    }
}

/// Websocket URL a controller uses to join the display behind `code`.
fn controller_url(relay_url: &str, code: &SessionCode) -> Result<String, CliError> {
    let base = relay_base(relay_url)?;
    Ok(format!("{base}/peer/{}?role=controller", code.peer_identity()))
}

/// HTTP health endpoint on the same host as the relay websocket.
fn health_url(relay_url: &str) -> Result<String, CliError> {
    let base = relay_base(relay_url)?;
    let http = match base.strip_prefix("wss://") {
        Some(rest) => format!("https://{rest}"),
        None => format!("http://{}", base.trim_start_matches("ws://")),
    };
    Ok(format!("{http}/healthz"))
}

async fn ping(relay_url: &str) -> Result<(), CliError> {
    let response = reqwest::get(health_url(relay_url)?).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::Unhealthy(status.as_u16()));
    }
    println!("ok");
    Ok(())
}

// =============================================================================
// PEER CHANNEL
// =============================================================================

/// One decoded text frame from the relay.
#[derive(Debug, PartialEq)]
enum Inbound {
    Board(Message),
    Notice(RelayNotice),
    Unknown(String),
}

fn classify(text: &str) -> Inbound {
    match decode_message(text) {
        Ok(message) => Inbound::Board(message),
        Err(_) => match decode_notice(text) {
            Ok(notice) => Inbound::Notice(notice),
            Err(_) => Inbound::Unknown(text.to_owned()),
        },
    }
}

async fn join(relay_url: &str, code: &str) -> Result<PeerStream, CliError> {
    let code = SessionCode::parse(code)?;
    let (stream, _) = connect_async(controller_url(relay_url, &code)?).await?;
    Ok(stream)
}

/// Next text frame, skipping pings and binary frames.
async fn recv_next(stream: &mut PeerStream, wait: Option<Duration>) -> Result<Inbound, CliError> {
    loop {
        let next = match wait {
            Some(wait) => tokio::time::timeout(wait, stream.next()).await.map_err(|_| CliError::Timeout)?,
            None => stream.next().await,
        };
        match next {
            Some(Ok(WsMessage::Text(text))) => return Ok(classify(text.as_str())),
            Some(Ok(WsMessage::Close(_))) | None => return Err(CliError::WsClosed),
            Some(Ok(_)) => {}
            Some(Err(err)) => return Err(err.into()),
        }
    }
}

/// Wait for the display to acknowledge the controller with a snapshot.
async fn await_display(stream: &mut PeerStream) -> Result<BoardSnapshot, CliError> {
    loop {
        match recv_next(stream, Some(DISPLAY_WAIT)).await? {
            Inbound::Board(Message::SyncBoard { payload }) => return Ok(payload),
            Inbound::Notice(RelayNotice::Rejected { reason }) => return Err(CliError::Rejected(reason)),
            _ => {}
        }
    }
}

async fn send(stream: &mut PeerStream, message: &Message) -> Result<(), CliError> {
    stream.send(WsMessage::Text(encode_message(message).into())).await?;
    Ok(())
}

// =============================================================================
// WATCH
// =============================================================================

async fn watch(relay_url: &str, args: WatchArgs) -> Result<(), CliError> {
    let mut stream = join(relay_url, &args.code).await?;
    let mut seen = 0usize;
    while args.count.is_none_or(|count| seen < count) {
        match recv_next(&mut stream, None).await? {
            Inbound::Board(message) => {
                seen += 1;
                println!("{:<10} {}", message.kind(), summarize(&message));
            }
            Inbound::Notice(RelayNotice::Rejected { reason }) => return Err(CliError::Rejected(reason)),
            Inbound::Notice(notice) => println!("notice     {notice:?}"),
            Inbound::Unknown(text) => eprintln!("ignored    {text}"),
        }
    }
    stream.close(None).await?;
    Ok(())
}

fn summarize(message: &Message) -> String {
    match message {
        Message::SyncBoard { payload } => format!(
            "strokes={} background={} zoom={:?}",
            payload.strokes.len(),
            payload.background_image.as_deref().unwrap_or("none"),
            payload.zoom,
        ),
        other => encode_message(other),
    }
}

// =============================================================================
// REPLAY
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum StrokeFile {
    Page { strokes: Vec<Stroke> },
    List(Vec<Stroke>),
}

fn parse_stroke_file(text: &str) -> Result<Vec<Stroke>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        StrokeFile::Page { strokes } | StrokeFile::List(strokes) => strokes,
    })
}

/// The `start`/`move`/`end` sequence a controller would send for `stroke`.
fn stroke_messages(stroke: &Stroke) -> Vec<Message> {
    let tools = ToolState { tool: stroke.tool, color: stroke.color, size: stroke.size };
    let Some((first, rest)) = stroke.points.split_first() else {
        return Vec::new();
    };
    let mut messages = Vec::with_capacity(stroke.points.len() + 1);
    messages.push(Message::Start(InputEvent::at(*first, tools)));
    messages.extend(rest.iter().map(|point| Message::Move(InputEvent::at(*point, tools))));
    messages.push(Message::End(InputEvent::end(tools)));
    messages
}

async fn replay(relay_url: &str, args: ReplayArgs) -> Result<(), CliError> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .map_err(|source| CliError::Io { path: args.file.clone(), source })?;
    let strokes = parse_stroke_file(&text)?;

    let mut stream = join(relay_url, &args.code).await?;
    let board = await_display(&mut stream).await?;
    eprintln!("display has {} strokes; replaying {}", board.strokes.len(), strokes.len());

    let pace = Duration::from_secs_f64(args.interval_ms.max(0.0) / 1000.0);
    let mut throttle = MoveThrottle::new(args.interval_ms);
    let started = Instant::now();
    let (mut sent, mut dropped) = (0usize, 0usize);
    for stroke in &strokes {
        for message in stroke_messages(stroke) {
            if matches!(message, Message::Move(_)) {
                tokio::time::sleep(pace).await;
            }
            let now_ms = started.elapsed().as_secs_f64() * 1000.0;
            if throttle.admit(&message, now_ms) {
                send(&mut stream, &message).await?;
                sent += 1;
            } else {
                dropped += 1;
            }
        }
    }

    stream.close(None).await?;
    eprintln!("sent {sent} messages ({dropped} throttled)");
    Ok(())
}
