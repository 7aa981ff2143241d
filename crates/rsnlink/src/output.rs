use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rsnlink::frame::{tag_name, UpFrame};
use rsnlink::packet::{flags, BatteryStatus, ChannelStats, Telemetry};
use rsnlink::transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    /// Hex dump of the raw payload.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    mean: u16,
    median: u16,
    min: u16,
    max: u16,
    std: u16,
}

impl From<&ChannelStats> for StatsOutput {
    fn from(stats: &ChannelStats) -> Self {
        Self {
            mean: stats.mean,
            median: stats.median,
            min: stats.min,
            max: stats.max,
            std: stats.std,
        }
    }
}

#[derive(Serialize)]
struct TelemetryOutput {
    gateway_ts_ms: u32,
    cycle: u32,
    node_ts_ms: u32,
    battery: String,
    flags: Vec<&'static str>,
    soil: StatsOutput,
    vbat: StatsOutput,
    ntc: StatsOutput,
    last_rssi: i8,
}

#[derive(Serialize)]
struct FrameOutput {
    frame: &'static str,
    node_id: u8,
    rssi: i8,
    mode: &'static str,
    hw_version: u8,
    fw_version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telemetry: Option<TelemetryOutput>,
    received_at: String,
}

impl FrameOutput {
    fn new(frame: &UpFrame) -> Self {
        let header = frame.inner_header();
        let mut out = Self {
            frame: tag_name(frame.tag()),
            node_id: frame.node_id(),
            rssi: frame.rssi(),
            mode: header.mode.name(),
            hw_version: header.hw_version,
            fw_version: header.fw_version,
            capabilities: None,
            status: None,
            telemetry: None,
            received_at: now_unix_seconds(),
        };
        match frame {
            UpFrame::Hello(f) => out.capabilities = Some(f.hello.capabilities),
            UpFrame::ConfigAck(f) => out.status = Some(f.ack.status),
            UpFrame::Telemetry(f) => {
                let t = &f.telemetry;
                out.telemetry = Some(TelemetryOutput {
                    gateway_ts_ms: f.local_ts_ms,
                    cycle: t.cycle,
                    node_ts_ms: t.ts_ms,
                    battery: battery_name(t.batt_status),
                    flags: flag_names(t.flags),
                    soil: (&t.soil).into(),
                    vbat: (&t.vbat).into(),
                    ntc: (&t.ntc).into(),
                    last_rssi: t.last_rssi,
                });
            }
        }
        out
    }
}

pub fn print_frame(frame: &UpFrame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&FrameOutput::new(frame)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAME", "NODE", "RSSI", "DETAIL"])
                .add_row(vec![
                    tag_name(frame.tag()).to_string(),
                    frame.node_id().to_string(),
                    frame.rssi().to_string(),
                    frame_detail(frame),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} node={} rssi={} {}",
                tag_name(frame.tag()),
                frame.node_id(),
                frame.rssi(),
                frame_detail(frame)
            );
        }
        OutputFormat::Raw => println!("{}", hex(&frame.to_payload())),
    }
}

#[derive(Serialize)]
struct SentOutput<'a> {
    frame: &'a str,
    node_id: u8,
    payload_size: usize,
    payload: String,
}

/// Report a downlink payload that was written to the gateway.
pub fn print_sent(frame: &str, node_id: u8, payload: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SentOutput {
                frame,
                node_id,
                payload_size: payload.len(),
                payload: hex(payload),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SENT", "NODE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    frame.to_string(),
                    node_id.to_string(),
                    payload.len().to_string(),
                    hex(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent {frame} node={node_id} size={}", payload.len());
        }
        OutputFormat::Raw => println!("{}", hex(payload)),
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = ports
                .iter()
                .map(|p| {
                    serde_json::json!({
                        "name": p.name,
                        "kind": p.kind,
                        "description": p.description,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "DESCRIPTION"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    port.description.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for port in ports {
                match &port.description {
                    Some(desc) => println!("{} ({}) {desc}", port.name, port.kind),
                    None => println!("{} ({})", port.name, port.kind),
                }
            }
        }
    }
}

fn frame_detail(frame: &UpFrame) -> String {
    match frame {
        UpFrame::Hello(f) => format!(
            "caps=0x{:04x} hw={} fw={} mode={}",
            f.hello.capabilities,
            f.hello.header.hw_version,
            f.hello.header.fw_version,
            f.hello.header.mode.name()
        ),
        UpFrame::ConfigAck(f) => format!("status={}", f.ack.status),
        UpFrame::Telemetry(f) => telemetry_detail(f.local_ts_ms, &f.telemetry),
    }
}

fn telemetry_detail(gateway_ts_ms: u32, t: &Telemetry) -> String {
    let mut out = format!(
        "cycle={} ts={} gw_ts={} batt={} soil={} vbat={} ntc={} last_rssi={}",
        t.cycle,
        t.ts_ms,
        gateway_ts_ms,
        battery_name(t.batt_status),
        t.soil.mean,
        t.vbat.mean,
        t.ntc.mean,
        t.last_rssi
    );
    let names = flag_names(t.flags);
    if !names.is_empty() {
        let _ = write!(out, " flags={}", names.join("|"));
    }
    out
}

pub fn battery_name(status: BatteryStatus) -> String {
    match status {
        BatteryStatus::Low => "LOW".to_string(),
        BatteryStatus::Medium => "MED".to_string(),
        BatteryStatus::High => "HIGH".to_string(),
        BatteryStatus::Other(raw) => format!("0x{raw:02x}"),
    }
}

pub fn flag_names(bits: u8) -> Vec<&'static str> {
    [
        (flags::LOW_BATT, "LOW_BATT"),
        (flags::LOST_RX, "LOST_RX"),
        (flags::DEBUG_MODE, "DEBUG_MODE"),
        (flags::WATCHDOG_RST, "WATCHDOG_RST"),
        (flags::BROWNOUT_RST, "BROWNOUT_RST"),
        (flags::FIRST_BOOT, "FIRST_BOOT"),
    ]
    .into_iter()
    .filter(|(bit, _)| bits & bit != 0)
    .map(|(_, name)| name)
    .collect()
}

fn hex(data: &[u8]) -> String {
    data.iter().fold(String::with_capacity(data.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
