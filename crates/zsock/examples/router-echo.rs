//! ROUTER echo server: every message is sent back to the peer it came from.
//!
//! Run with:
//!   cargo run --example router-echo
//!
//! In another terminal:
//!   cargo run --features cli -- send ">ipc:///tmp/zsock-router-echo.sock" \
//!     --pattern dealer --data hello --wait --wait-timeout 3s

use zsock::new_router;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_path = std::env::temp_dir().join("zsock-router-echo.sock");
    let endpoint = format!("ipc://{}", sock_path.display());

    let mut router = new_router(&endpoint)?;
    eprintln!("Listening on {endpoint}");

    let mut buf = vec![0u8; 64 * 1024];
    loop {
        // read_bytes strips the identity frame and remembers the sender, so
        // write_bytes goes straight back to it.
        let n = match router.read_bytes(&mut buf) {
            Ok(n) => n,
            Err(zsock::SocketError::BufferFull { written }) => {
                eprintln!("Message larger than {written} bytes, echoing the first part");
                written
            }
            Err(e) => {
                eprintln!("Receive failed: {e}");
                break;
            }
        };
        eprintln!(
            "Received {n} bytes from {:02x?}",
            router.last_client_id().as_ref()
        );
        router.write_bytes(&buf[..n])?;
    }

    Ok(())
}
