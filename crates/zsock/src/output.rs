use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    pattern: &'a str,
    peer_id: Option<String>,
    frame_count: usize,
    size: usize,
    frames: Vec<String>,
    timestamp: String,
}

/// A received message, split into the routing identity (ROUTER/STREAM
/// only) and its body frames.
pub struct Received<'a> {
    pub pattern: &'a str,
    pub peer_id: Option<&'a Bytes>,
    pub frames: &'a [Bytes],
}

pub fn print_message(msg: &Received<'_>, format: OutputFormat) {
    let size: usize = msg.frames.iter().map(Bytes::len).sum();
    let peer_id = msg.peer_id.map(|id| hex(id));

    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                pattern: msg.pattern,
                peer_id,
                frame_count: msg.frames.len(),
                size,
                frames: msg.frames.iter().map(|f| payload_preview(f)).collect(),
                timestamp: now_unix_seconds(),
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
                .set_header(vec!["FRAME", "SIZE", "PEER", "PAYLOAD"]);
            for (index, frame) in msg.frames.iter().enumerate() {
                table.add_row(vec![
                    index.to_string(),
                    frame.len().to_string(),
                    peer_id.clone().unwrap_or_else(|| "-".to_string()),
                    payload_preview(frame),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let frames: Vec<String> = msg.frames.iter().map(|f| payload_preview(f)).collect();
            println!(
                "pattern={} frames={} size={} peer={} payload=[{}]",
                msg.pattern,
                msg.frames.len(),
                size,
                peer_id.as_deref().unwrap_or("-"),
                frames.join(", ")
            );
        }
        OutputFormat::Raw => {
            for frame in msg.frames {
                print_raw(frame);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previews_text_and_binary() {
        assert_eq!(payload_preview(b"hello"), "hello");
        assert_eq!(payload_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn generated_identities_render_as_hex() {
        assert_eq!(hex(&[0x00, 0x00, 0x00, 0x00, 0x01]), "0000000001");
    }
}
