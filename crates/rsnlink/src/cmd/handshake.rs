use std::thread;
use std::time::Duration;

use rsnlink::frame::{build_down_handshake_payload, tag_name, DOWN_HANDSHAKE};
use crate::cmd::{open_link, validate_node_id, DownlinkSender, HandshakeArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

/// Pause after a handshake before the next downlink command.
pub const HANDSHAKE_SETTLE: Duration = Duration::from_millis(50);

pub fn run(args: HandshakeArgs, format: OutputFormat) -> CliResult<i32> {
    let node_id = validate_node_id(args.node_id)?;
    let transport = open_link(&args.link)?;
    send_handshake(&transport, node_id, args.hw_version, args.fw_version, format)?;
    transport.close();
    Ok(SUCCESS)
}

pub fn send_handshake<S: DownlinkSender + ?Sized>(
    transport: &S,
    node_id: u8,
    hw_version: u8,
    fw_version: u8,
    format: OutputFormat,
) -> CliResult<()> {
    let payload = build_down_handshake_payload(node_id, hw_version, fw_version);
    transport
        .send_downlink(&payload)
        .map_err(|err| transport_error("handshake failed", err))?;
    print_sent(tag_name(DOWN_HANDSHAKE), node_id, &payload, format);
    thread::sleep(HANDSHAKE_SETTLE);
    Ok(())
}
