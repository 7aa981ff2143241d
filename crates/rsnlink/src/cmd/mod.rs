use std::path::PathBuf;

use clap::{Args, Subcommand};
use rsnlink::transport::{auto_detect_port, LinkConfig, SerialTransport, DEFAULT_BAUD_RATE};
use tracing::info;

use crate::exit::{transport_error, CliError, CliResult, TRANSPORT_ERROR, USAGE};
use crate::output::OutputFormat;

pub mod handshake;
pub mod listen;
pub mod ports;
pub mod send_config;
pub mod version;

/// Value of `--port` that selects the first serial port found.
const AUTO_PORT: &str = "auto";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print frames relayed by the gateway.
    Listen(ListenArgs),
    /// Push a CONFIG packet to a node.
    SendConfig(SendConfigArgs),
    /// Send a HANDSHAKE to a node.
    Handshake(HandshakeArgs),
    /// List serial ports.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::SendConfig(args) => send_config::run(args, format),
        Command::Handshake(args) => handshake::run(args, format),
        Command::Ports => ports::run(format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Serial device of the gateway, or "auto".
    #[arg(long, short = 'p', env = "RSNLINK_PORT", default_value = AUTO_PORT)]
    pub port: String,
    /// UART speed.
    #[arg(long, short = 'b', env = "RSNLINK_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud: u32,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Node to address with --send-config / --send-handshake.
    #[arg(long)]
    pub node_id: Option<u16>,
    /// Push this settings file to --node-id once the link is up.
    #[arg(long, value_name = "FILE", requires = "node_id")]
    pub send_config: Option<PathBuf>,
    /// Send a handshake to --node-id before anything else. A failed send is
    /// logged and listening continues.
    #[arg(long, requires = "node_id")]
    pub send_handshake: bool,
}

#[derive(Args, Debug)]
pub struct SendConfigArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Target node (1-255).
    #[arg(long)]
    pub node_id: u16,
    /// Settings file (JSON). Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Send a handshake first.
    #[arg(long)]
    pub handshake: bool,
}

#[derive(Args, Debug)]
pub struct HandshakeArgs {
    #[command(flatten)]
    pub link: LinkArgs,
    /// Target node (1-255).
    #[arg(long)]
    pub node_id: u16,
    #[arg(long, default_value_t = rsnlink::packet::DEFAULT_HW_VERSION)]
    pub hw_version: u8,
    #[arg(long, default_value_t = rsnlink::packet::DEFAULT_FW_VERSION)]
    pub fw_version: u8,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Node ids are 1..=255 on the air; 0 is never assigned.
pub fn validate_node_id(raw: u16) -> CliResult<u8> {
    match u8::try_from(raw) {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(CliError::new(
            USAGE,
            format!("node id must be in 1..=255, got {raw}"),
        )),
    }
}

fn resolve_port(requested: &str) -> CliResult<String> {
    if requested != AUTO_PORT {
        return Ok(requested.to_string());
    }
    let port = auto_detect_port()
        .ok_or_else(|| CliError::new(TRANSPORT_ERROR, "no serial port found"))?;
    info!(port = %port, "auto-detected serial port");
    Ok(port)
}

/// Open the gateway link described by `args`.
pub fn open_link(args: &LinkArgs) -> CliResult<SerialTransport> {
    let port = resolve_port(&args.port)?;
    let config = LinkConfig {
        baud_rate: args.baud,
        ..LinkConfig::default()
    };
    let transport = SerialTransport::serial(port, config);
    transport
        .open()
        .map_err(|err| transport_error("open failed", err))?;
    Ok(transport)
}

/// Anything downlink command payloads can be written to.
pub trait DownlinkSender {
    fn send_downlink(&self, payload: &[u8]) -> rsnlink::transport::Result<()>;
}

impl DownlinkSender for SerialTransport {
    fn send_downlink(&self, payload: &[u8]) -> rsnlink::transport::Result<()> {
        self.send_payload(payload)
    }
}
