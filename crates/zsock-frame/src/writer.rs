use std::io::{ErrorKind, Write};

use bytes::{Bytes, BytesMut};
use zsock_transport::TransportStream;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::flags::{Flag, COMMAND, MORE};
use crate::reader::transport_to_frame_error;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames and multipart messages to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.buf.clear();
        self.encode(frame.flags(), frame.data())?;
        self.drain()
    }

    /// Encode and send one data frame.
    pub fn send(&mut self, flag: Flag, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        self.encode(flag.bits(), payload)?;
        self.drain()
    }

    /// Encode and send one command frame.
    pub fn send_command(&mut self, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        self.encode(COMMAND, payload)?;
        self.drain()
    }

    /// Encode a whole message and hand it to the stream in one pass.
    ///
    /// Every frame but the last carries MORE. Nothing is written if any frame
    /// exceeds the payload limit.
    pub fn write_message(&mut self, frames: &[Bytes]) -> Result<()> {
        self.buf.clear();
        let last = frames.len().saturating_sub(1);
        for (index, frame) in frames.iter().enumerate() {
            let flags = if index < last { MORE } else { 0 };
            self.encode(flags, frame)?;
        }
        self.drain()
    }

    fn encode(&mut self, flags: u8, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            self.buf.clear();
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(flags, payload, &mut self.buf)
    }

    fn drain(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame encoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<TransportStream> {
    /// Create a frame writer for a transport stream and apply the write
    /// timeout from config.
    pub fn with_config_stream(inner: TransportStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }

    /// Change the write timeout of the underlying stream.
    pub fn set_write_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.config.write_timeout = timeout;
        self.inner
            .set_write_timeout(timeout)
            .map_err(transport_to_frame_error)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::decode_frame;

    fn decode_all(wire: Vec<u8>) -> Vec<Frame> {
        let mut wire = BytesMut::from(wire.as_slice());
        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut wire, usize::MAX).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn write_single_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(Flag::None, b"hello").unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data().as_ref(), b"hello");
        assert!(!frames[0].more());
    }

    #[test]
    fn write_message_sets_more_on_all_but_last() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer
            .write_message(&[
                Bytes::from_static(b"one"),
                Bytes::from_static(b"two"),
                Bytes::from_static(b"three"),
            ])
            .unwrap();

        let flags: Vec<Flag> = decode_all(writer.into_inner().into_inner())
            .iter()
            .map(Frame::flag)
            .collect();
        assert_eq!(flags, vec![Flag::More, Flag::More, Flag::None]);
    }

    #[test]
    fn oversized_frame_in_message_writes_nothing() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer
            .write_message(&[Bytes::from_static(b"ok"), Bytes::from_static(b"oversized")])
            .unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(writer.into_inner().into_inner().is_empty());
    }

    #[test]
    fn command_frames_carry_command_flag() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send_command(b"{\"protocol\":\"zsock\"}").unwrap();
        writer.write_frame(&Frame::new("abc", Flag::More)).unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        assert!(frames[0].is_command());
        assert!(frames[1].more());
    }

    #[test]
    fn flush_propagates() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(Flag::None, b"x").unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn handles_interrupted_and_would_block_writes() {
        let mut writer = FrameWriter::new(FlakyWriter {
            failures: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            data: Vec::new(),
        });
        writer.send(Flag::None, b"retry").unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn connection_closed_when_write_returns_zero() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(Flag::None, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn written_bytes_decode_with_reader() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(Flag::None, b"z").unwrap();

        let wire = writer.into_inner().into_inner();
        let mut framed = crate::reader::FrameReader::new(Cursor::new(wire));
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.data().as_ref(), b"z");
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FlakyWriter {
        failures: Vec<ErrorKind>,
        data: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.failures.pop() {
                return Err(std::io::Error::from(kind));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
