#![cfg(unix)]

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rsnlink::frame::{
    build_default_handshake_payload, build_down_config_payload, HelloFrame, TelemetryFrame,
    UpFrame,
};
use rsnlink::frame_channel;
use rsnlink::packet::{decode_config, flags, Config, Hello, Telemetry};
use rsnlink::transport::{Link, LinkConfig, SerialTransport};

type Gateway = Arc<Mutex<Option<UnixStream>>>;

fn simulated_gateway() -> (SerialTransport, Gateway) {
    let gateway: Gateway = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&gateway);
    let opener = move || -> io::Result<Box<dyn Link>> {
        let (host, gw) = UnixStream::pair()?;
        host.set_read_timeout(Some(Duration::from_millis(20)))?;
        gw.set_read_timeout(Some(Duration::from_secs(2)))?;
        *slot.lock().unwrap() = Some(gw);
        Ok(Box::new(host))
    };
    let config = LinkConfig {
        read_timeout: Duration::from_millis(20),
        ..LinkConfig::default()
    };
    (SerialTransport::new(opener, config), gateway)
}

fn gateway_stream(gateway: &Gateway) -> UnixStream {
    gateway
        .lock()
        .unwrap()
        .as_ref()
        .expect("link should be open")
        .try_clone()
        .unwrap()
}

fn write_frame(stream: &mut UnixStream, payload: &[u8]) {
    stream
        .write_all(&(payload.len() as u16).to_le_bytes())
        .unwrap();
    stream.write_all(payload).unwrap();
}

#[test]
fn uplink_frames_reach_the_consumer() {
    let (transport, gateway) = simulated_gateway();
    transport.open().unwrap();
    let (dispatcher, frames) = frame_channel();
    let stats = dispatcher.stats();
    transport.start_reader(dispatcher).unwrap();

    let mut gw = gateway_stream(&gateway);
    write_frame(&mut gw, &[0xA1, 0x05, 0xD6, 0x01, 0x05, 0x00, 0x01, 0x01, 0x03, 0x00]);

    let mut telemetry = Telemetry::new(5, 42, 60_000);
    telemetry.flags = flags::LOW_BATT;
    telemetry.last_rssi = -61;
    let sent = UpFrame::Telemetry(TelemetryFrame {
        node_id: 5,
        rssi: -55,
        local_ts_ms: 1_000,
        telemetry,
    });
    write_frame(&mut gw, &[0xEE, 0x01, 0x02]);
    write_frame(&mut gw, &sent.to_payload());

    let hello = frames.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(
        hello,
        UpFrame::Hello(HelloFrame {
            node_id: 5,
            rssi: -42,
            hello: Hello::new(5, 3),
        })
    );

    let received = frames.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(received, sent);
    let UpFrame::Telemetry(frame) = received else {
        panic!("expected telemetry");
    };
    assert!(frame.telemetry.low_battery());

    assert_eq!(stats.delivered(), 2);
    assert_eq!(stats.dropped(), 1);
    transport.close();
}

#[test]
fn handshake_then_config_on_the_wire() {
    let (transport, gateway) = simulated_gateway();
    transport.open().unwrap();
    let mut gw = gateway_stream(&gateway);

    transport
        .send_payload(&build_default_handshake_payload(7))
        .unwrap();
    let config = Config {
        sleep_time_s: 60,
        ..Config::for_node(7)
    };
    transport
        .send_payload(&build_down_config_payload(7, &config))
        .unwrap();

    let mut handshake = [0u8; 9];
    gw.read_exact(&mut handshake).unwrap();
    assert_eq!(
        handshake,
        [0x07, 0x00, 0xB2, 0x07, 0x02, 0x07, 0x00, 0x01, 0x01]
    );

    let mut prefix = [0u8; 2];
    gw.read_exact(&mut prefix).unwrap();
    assert_eq!(prefix, [0x14, 0x00]);
    let mut body = [0u8; 20];
    gw.read_exact(&mut body).unwrap();
    assert_eq!(&body[..2], &[0xB1, 0x07]);
    assert_eq!(decode_config(&body[2..]).unwrap(), config);

    transport.close();
}

#[test]
fn gateway_hangup_ends_the_stream_of_frames() {
    let (transport, gateway) = simulated_gateway();
    transport.open().unwrap();
    let (dispatcher, frames) = frame_channel();
    transport.start_reader(dispatcher).unwrap();

    gateway.lock().unwrap().take();

    assert!(frames.recv_timeout(Duration::from_secs(5)).is_err());
    let fault = transport.take_fault().expect("hangup should be recorded");
    assert_eq!(fault.kind(), io::ErrorKind::UnexpectedEof);

    let deadline = Instant::now() + Duration::from_secs(2);
    while transport.reader_running() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert!(!transport.reader_running());
}
