//! Interactive chat client binary.
//!
//! Announces itself with a `presence` envelope, then relays stdin lines as
//! `message` envelopes while printing everything fanned out by the server.

use clap::Parser;
use relay_core::{ActionKind, Envelope, Message, StatusCode};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing_subscriber::EnvFilter;

const MAX_PAYLOAD_LEN: usize = 4096;

#[derive(Debug, Parser)]
#[command(name = "relay-client", about = "Interactive client for the chat relay")]
struct Args {
    /// Server to connect to.
    #[arg(long, env = "RELAY_SERVER", default_value = "127.0.0.1:7777")]
    server: String,
    /// Account name to announce.
    #[arg(long)]
    name: String,
    /// Status text sent with presence.
    #[arg(long, default_value = "Online")]
    status: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let stream = TcpStream::connect(&args.server).await?;
    let (mut reader, mut writer) = stream.into_split();

    let presence = Message::new(ActionKind::Presence)
        .with_field("type", "status")
        .with_field(
            "user",
            json!({"account_name": args.name, "status": args.status}),
        );
    writer.write_all(&presence.encode()?).await?;

    let mut buf = vec![0u8; MAX_PAYLOAD_LEN];
    let n = reader.read(&mut buf).await?;
    match Envelope::decode(&buf[..n])? {
        Envelope::Response(response) if response.status() == StatusCode::Ok => {
            println!("connected to {} as {}", args.server, args.name);
        }
        other => anyhow::bail!("presence rejected: {other:?}"),
    }

    println!("type messages, /quit to leave");
    tokio::select! {
        result = send_loop(&mut writer, &args.name) => result,
        result = print_loop(&mut reader) => result,
    }
}

/// Turn stdin lines into broadcast `message` envelopes.
async fn send_loop(writer: &mut OwnedWriteHalf, name: &str) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" {
            writer.write_all(&Message::new(ActionKind::Quit).encode()?).await?;
            break;
        }
        let message = Message::new(ActionKind::Message)
            .with_field("to", "all")
            .with_field("from", name)
            .with_field("message", line);
        writer.write_all(&message.encode()?).await?;
    }
    Ok(())
}

/// Print acks and fanned-out chat traffic as it arrives.
async fn print_loop(reader: &mut OwnedReadHalf) -> anyhow::Result<()> {
    let mut buf = vec![0u8; MAX_PAYLOAD_LEN];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            println!("server closed the connection");
            return Ok(());
        }
        match Envelope::decode(&buf[..n]) {
            Ok(Envelope::Message(message)) => {
                let from = message
                    .field("from")
                    .and_then(|v| v.as_str())
                    .unwrap_or("<unknown>");
                let text = message
                    .field("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                println!("{from}: {text}");
            }
            Ok(Envelope::Response(response)) => {
                if response.status().is_error() {
                    let detail = response
                        .field("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    eprintln!("server error {}: {detail}", u16::from(response.status()));
                }
            }
            Err(err) => eprintln!("undecodable envelope: {err}"),
        }
    }
}
