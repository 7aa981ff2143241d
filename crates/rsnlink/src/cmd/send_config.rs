use std::path::Path;

use rsnlink::frame::{build_down_config_payload, tag_name, DOWN_CONFIG};
use rsnlink::packet::{DEFAULT_FW_VERSION, DEFAULT_HW_VERSION};
use rsnlink::NodeSettings;
use tracing::info;

use crate::cmd::handshake::send_handshake;
use crate::cmd::{open_link, validate_node_id, DownlinkSender, SendConfigArgs};
use crate::exit::{settings_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendConfigArgs, format: OutputFormat) -> CliResult<i32> {
    let node_id = validate_node_id(args.node_id)?;
    let settings = load_settings(args.config.as_deref())?;

    let transport = open_link(&args.link)?;
    if args.handshake {
        send_handshake(
            &transport,
            node_id,
            DEFAULT_HW_VERSION,
            DEFAULT_FW_VERSION,
            format,
        )?;
    }
    send_config(&transport, node_id, &settings, format)?;
    transport.close();
    Ok(SUCCESS)
}

pub fn load_settings(path: Option<&Path>) -> CliResult<NodeSettings> {
    match path {
        Some(path) => {
            let settings = NodeSettings::load(path)
                .map_err(|err| settings_error("failed loading node settings", err))?;
            info!(path = %path.display(), "node settings loaded");
            Ok(settings)
        }
        None => Ok(NodeSettings::default()),
    }
}

pub fn send_config<S: DownlinkSender + ?Sized>(
    transport: &S,
    node_id: u8,
    settings: &NodeSettings,
    format: OutputFormat,
) -> CliResult<()> {
    let payload = build_down_config_payload(node_id, &settings.to_config(node_id));
    transport
        .send_downlink(&payload)
        .map_err(|err| transport_error("config send failed", err))?;
    print_sent(tag_name(DOWN_CONFIG), node_id, &payload, format);
    Ok(())
}
