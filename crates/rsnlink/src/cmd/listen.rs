use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use rsnlink::frame_channel;
use rsnlink::packet::{DEFAULT_FW_VERSION, DEFAULT_HW_VERSION};
use rsnlink::NodeSettings;
use tracing::{error, info};

use crate::cmd::handshake::send_handshake;
use crate::cmd::send_config::{load_settings, send_config};
use crate::cmd::{open_link, validate_node_id, DownlinkSender, ListenArgs};
use crate::exit::{transport_error, CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let node_id = args.node_id.map(validate_node_id).transpose()?;
    let settings = match &args.send_config {
        Some(path) => Some(load_settings(Some(path.as_path()))?),
        None => None,
    };

    let transport = open_link(&args.link)?;
    let (dispatcher, frames) = frame_channel();
    let stats = dispatcher.stats();
    transport
        .start_reader(dispatcher)
        .map_err(|err| transport_error("reader start failed", err))?;

    if let Some(node_id) = node_id {
        push_node_commands(
            &transport,
            node_id,
            args.send_handshake,
            settings.as_ref(),
            format,
        );
    }

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        match frames.recv_timeout(POLL_INTERVAL) {
            Ok(frame) => {
                print_frame(&frame, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !transport.reader_running() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    transport.close();
    info!(
        delivered = stats.delivered(),
        dropped = stats.dropped(),
        "listen finished"
    );

    match transport.take_fault() {
        Some(err) => Err(CliError::new(
            TRANSPORT_ERROR,
            format!("link failed: {err}"),
        )),
        None => Ok(SUCCESS),
    }
}

/// Send the optional handshake and then the optional config to one node.
///
/// Failures are logged and do not stop the other command or the listen loop.
fn push_node_commands<S: DownlinkSender + ?Sized>(
    sender: &S,
    node_id: u8,
    handshake: bool,
    settings: Option<&NodeSettings>,
    format: OutputFormat,
) {
    if handshake {
        match send_handshake(sender, node_id, DEFAULT_HW_VERSION, DEFAULT_FW_VERSION, format) {
            Ok(()) => info!(node_id, "handshake sent"),
            Err(err) => error!(node_id, err = %err, "handshake send failed"),
        }
    }
    if let Some(settings) = settings {
        match send_config(sender, node_id, settings, format) {
            Ok(()) => info!(node_id, "config sent"),
            Err(err) => error!(node_id, err = %err, "config send failed"),
        }
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use rsnlink::frame::{DOWN_CONFIG, DOWN_HANDSHAKE};
    use rsnlink::transport::{Result as TransportResult, TransportError};

    use super::*;

    struct MockSender {
        fail_tags: Vec<u8>,
        sent: RefCell<Vec<Vec<u8>>>,
    }

    impl MockSender {
        fn failing_on(fail_tags: &[u8]) -> Self {
            Self {
                fail_tags: fail_tags.to_vec(),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn sent_tags(&self) -> Vec<u8> {
            self.sent.borrow().iter().map(|p| p[0]).collect()
        }
    }

    impl DownlinkSender for MockSender {
        fn send_downlink(&self, payload: &[u8]) -> TransportResult<()> {
            if self.fail_tags.contains(&payload[0]) {
                return Err(TransportError::Closed);
            }
            self.sent.borrow_mut().push(payload.to_vec());
            Ok(())
        }
    }

    #[test]
    fn failed_handshake_still_sends_config() {
        let sender = MockSender::failing_on(&[DOWN_HANDSHAKE]);
        let settings = NodeSettings::default();

        push_node_commands(&sender, 7, true, Some(&settings), OutputFormat::Raw);

        assert_eq!(sender.sent_tags(), vec![DOWN_CONFIG]);
        assert_eq!(sender.sent.borrow()[0][1], 7);
    }

    #[test]
    fn handshake_goes_out_before_config() {
        let sender = MockSender::failing_on(&[]);
        let settings = NodeSettings::default();

        push_node_commands(&sender, 3, true, Some(&settings), OutputFormat::Raw);

        assert_eq!(sender.sent_tags(), vec![DOWN_HANDSHAKE, DOWN_CONFIG]);
    }

    #[test]
    fn failed_config_is_not_fatal() {
        let sender = MockSender::failing_on(&[DOWN_CONFIG]);
        let settings = NodeSettings::default();

        push_node_commands(&sender, 3, false, Some(&settings), OutputFormat::Raw);

        assert!(sender.sent_tags().is_empty());
    }
}
