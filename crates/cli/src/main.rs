use async_trait::async_trait;
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use lib::channels::{join_path, BotResponse, Button, MessageHandler, RenderedMessage, UserMessage};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Parley CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the HTTP server with the built-in echo dialogue (REST channel at <route>/rest).
    Serve {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 5005)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Send one message to a running server's REST channel and print the replies.
    Send {
        /// Config file path (default: PARLEY_CONFIG_PATH or ~/.parley/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Sender id (default: the server's default sender)
        #[arg(long, value_name = "ID")]
        sender: Option<String>,

        /// Print replies as they are produced instead of all at once.
        #[arg(long)]
        stream: bool,

        /// Message text
        message: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            sender,
            stream,
            message,
        }) => {
            if let Err(e) = run_send(config, sender, stream, message).await {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

/// Echo dialogue: repeats the text back. "/help" shows a button menu instead.
struct EchoAgent;

#[async_trait]
impl MessageHandler for EchoAgent {
    async fn handle(&self, message: UserMessage) -> anyhow::Result<()> {
        let Some(text) = message.text().map(str::trim).filter(|t| !t.is_empty()) else {
            return Ok(());
        };
        let response = if text.eq_ignore_ascii_case("/help") {
            BotResponse::text("What would you like to do?").with_buttons(vec![
                Button::new("Say hello", "hello"),
                Button::new("Start over", "/restart"),
            ])
        } else {
            BotResponse::text(text)
        };
        message.reply(&response).await?;
        Ok(())
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting server on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );
    lib::server::run_server(config, Arc::new(EchoAgent)).await
}

async fn run_send(
    config_path: Option<std::path::PathBuf>,
    sender: Option<String>,
    stream: bool,
    message: String,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let prefix = config
        .channels
        .rest
        .url_prefix
        .clone()
        .unwrap_or_else(|| "rest".to_string());
    let path = join_path(&join_path(&config.server.route, &prefix), "webhook");
    let url = format!(
        "http://{}:{}{}?stream={}",
        config.server.bind.trim(),
        config.server.port,
        path,
        stream
    );
    let body = serde_json::json!({ "sender": sender, "message": message });

    let res = reqwest::Client::new().post(&url).json(&body).send().await?;
    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        anyhow::bail!("{} returned {} {}", url, status, text);
    }

    if stream {
        read_streamed(res, |m| print_message(&m)).await?;
    } else {
        let messages: Vec<RenderedMessage> = res.json().await?;
        for m in &messages {
            print_message(m);
        }
    }
    Ok(())
}

/// Read a newline-delimited stream of messages, handing each one over as soon as its line is complete.
async fn read_streamed(
    res: reqwest::Response,
    mut on_message: impl FnMut(RenderedMessage),
) -> anyhow::Result<()> {
    let mut chunks = res.bytes_stream();
    let mut lines = LineBuffer::default();
    while let Some(chunk) = chunks.next().await {
        for message in lines.push(&chunk?)? {
            on_message(message);
        }
    }
    Ok(())
}

/// Reassembles JSON lines from byte chunks. Chunks may end anywhere, including
/// inside a multi-byte character, so bytes are only decoded once a line is whole.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, chunk: &[u8]) -> anyhow::Result<Vec<RenderedMessage>> {
        self.pending.extend_from_slice(chunk);
        let mut messages = Vec::new();
        while let Some(idx) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=idx).collect();
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            messages.push(serde_json::from_slice(&line)?);
        }
        Ok(messages)
    }
}

fn print_message(message: &RenderedMessage) {
    if let Some(text) = message.text_content() {
        println!("< {}", text);
    }
    if let Some(buttons) = message.buttons() {
        for (idx, button) in buttons.iter().enumerate() {
            println!("  {}", lib::channels::button_to_string(button, idx));
        }
    }
    if let Some(image) = message.image_url() {
        println!("< [image] {}", image);
    }
    if let Some(attachment) = message.attachment_content() {
        println!("< [attachment] {}", attachment);
    }
}
