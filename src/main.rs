use bytes::Bytes;
use clap::Parser;
use clap::error::ErrorKind;
use color_eyre::eyre::Result;
use echo6::client::ClientResult;
use echo6::{ClientConfig, ClientConfigBuilder, DEFAULT_CHUNK_SIZE, EchoClient, ServerAddress};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Send one message to a TCP echo server over IPv6 and print the reply
#[derive(Parser, Debug)]
#[command(name = "echo6", version)]
struct Args {
    /// Server IPv6 address literal
    server: String,

    /// Server port
    port: u16,

    /// Message to echo
    message: String,

    /// Deadline for the whole reply in milliseconds (0 waits indefinitely)
    #[arg(long, value_name = "MS", default_value_t = 30_000)]
    timeout: u64,

    /// Connect timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 10_000)]
    connect_timeout: u64,

    /// Maximum bytes requested per read
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Also accept IPv4 server addresses
    #[arg(short = '4', long)]
    allow_ipv4: bool,
}

impl Args {
    /// Client configuration selected by the command-line flags
    fn client_config(&self) -> ClientConfig {
        let read_timeout = match self.timeout {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        ClientConfigBuilder::new()
            .connect_timeout(Duration::from_millis(self.connect_timeout))
            .read_timeout(read_timeout)
            .chunk_size(self.chunk_size)
            .allow_ipv4(self.allow_ipv4)
            .build()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Logs go to stderr; stdout carries only the echoed message
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("echo6=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("echo6: {e}");
            std::process::exit(1);
        }
    };

    match run(args).await {
        Ok(reply) => {
            // Printed as data, never interpreted.
            println!("{}", String::from_utf8_lossy(&reply));
            Ok(())
        }
        Err(e) => {
            eprintln!("echo6: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(args: Args) -> ClientResult<Bytes> {
    let address = ServerAddress::parse(&args.server, args.port)?;
    let config = args.client_config();

    info!(server = %address, bytes = args.message.len(), "Starting echo exchange");
    let client = EchoClient::connect_with_config(address, config).await?;
    client.echo(args.message.into_bytes()).await
}
