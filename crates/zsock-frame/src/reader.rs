use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;
use zsock_transport::TransportStream;

use crate::codec::{decode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::flags;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames and multipart messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                trace!(kind = flags::describe(frame.flags()), len = frame.len(), "frame read");
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read one complete message (blocking).
    ///
    /// Data frames are collected until one without the MORE flag arrives. A
    /// command frame is always a message on its own and is returned as a
    /// single-element vector.
    pub fn read_message(&mut self) -> Result<Vec<Frame>> {
        let mut frames = Vec::new();
        loop {
            let frame = self.read_frame()?;
            if frame.is_command() {
                if !frames.is_empty() {
                    return Err(FrameError::InterleavedCommand);
                }
                return Ok(vec![frame]);
            }
            let more = frame.more();
            frames.push(frame);
            if !more {
                return Ok(frames);
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

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update maximum payload size for subsequent frame decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameReader<TransportStream> {
    /// Create a frame reader for a transport stream and apply the read
    /// timeout from config.
    pub fn with_config_stream(inner: TransportStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }

    /// Change the read timeout of the underlying stream.
    pub fn set_read_timeout(&mut self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.config.read_timeout = timeout;
        self.inner
            .set_read_timeout(timeout)
            .map_err(transport_to_frame_error)
    }
}

pub(crate) fn transport_to_frame_error(err: zsock_transport::TransportError) -> FrameError {
    match err {
        zsock_transport::TransportError::Io(io) | zsock_transport::TransportError::Accept(io) => {
            FrameError::Io(io)
        }
        zsock_transport::TransportError::Bind { source, .. }
        | zsock_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, MAGIC};
    use crate::flags::{Flag, COMMAND, MORE};

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_frame(0, b"hello", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.flag(), Flag::None);
        assert_eq!(frame.data().as_ref(), b"hello");
    }

    #[test]
    fn read_multipart_message() {
        let mut wire = BytesMut::new();
        encode_frame(MORE, b"Hello", &mut wire).unwrap();
        encode_frame(MORE, b"", &mut wire).unwrap();
        encode_frame(0, b" World", &mut wire).unwrap();
        encode_frame(0, b"next", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let message = reader.read_message().unwrap();
        let parts: Vec<&[u8]> = message.iter().map(|f| f.data().as_ref()).collect();
        assert_eq!(parts, vec![b"Hello".as_ref(), b"".as_ref(), b" World".as_ref()]);

        let next = reader.read_message().unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].data().as_ref(), b"next");
    }

    #[test]
    fn command_frame_is_its_own_message() {
        let mut wire = BytesMut::new();
        encode_frame(COMMAND, b"\x01news", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let message = reader.read_message().unwrap();
        assert_eq!(message.len(), 1);
        assert!(message[0].is_command());
    }

    #[test]
    fn command_inside_multipart_is_rejected() {
        let mut wire = BytesMut::new();
        encode_frame(MORE, b"part", &mut wire).unwrap();
        encode_frame(COMMAND, b"\x01", &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::InterleavedCommand));
    }

    #[test]
    fn read_frame_with_large_payload() {
        let payload = vec![0xAB; 64 * 1024];
        let mut wire = BytesMut::new();
        encode_frame(0, &payload, &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.data().as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_frame(MORE, b"slow", &mut wire).unwrap();
        encode_frame(0, b"drip", &mut wire).unwrap();

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let message = reader.read_message().unwrap();
        assert_eq!(message.len(), 2);
        assert_eq!(message[1].data().as_ref(), b"drip");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_message() {
        let mut partial = BytesMut::new();
        encode_frame(MORE, b"first", &mut partial).unwrap();
        partial.put_slice(&MAGIC);
        partial.put_u8(0);
        partial.put_u32_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn oversized_frame_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_slice(&MAGIC);
        wire.put_u8(0);
        wire.put_u32_le(1024);

        let cfg = FrameConfig {
            max_payload_size: 16,
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config(Cursor::new(wire.to_vec()), cfg);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_frame(0, b"ok", &mut wire).unwrap();

        let reader = InterruptedThenData {
            interrupted: false,
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.data().as_ref(), b"ok");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer
            .write_message(&[bytes::Bytes::from_static(b"ping"), bytes::Bytes::new()])
            .unwrap();
        let message = reader.read_message().unwrap();

        assert_eq!(message.len(), 2);
        assert_eq!(message[0].data().as_ref(), b"ping");
        assert!(message[1].is_empty());
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let remaining = self.bytes.len() - self.pos;
            let n = remaining.min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
