//! PUB/SUB example: one publisher, two subscribers with different topics.
//!
//! Run with:
//!   cargo run --example weather-feed

use std::thread;

use zsock::{new_pub, new_sub, Flag};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut publisher = new_pub("inproc://weather")?;
    let mut kitchen = new_sub("inproc://weather", "temp.kitchen")?;
    let mut everything = new_sub("inproc://weather", "")?;

    let reader = thread::spawn(move || -> Result<(), zsock::SocketError> {
        for _ in 0..2 {
            let msg = kitchen.recv_message()?;
            eprintln!(
                "[kitchen] {} = {}",
                String::from_utf8_lossy(&msg[0]),
                String::from_utf8_lossy(&msg[1])
            );
        }
        Ok(())
    });

    for (topic, value) in [
        ("temp.kitchen", "21.5"),
        ("temp.garage", "9.0"),
        ("temp.kitchen", "22.0"),
        ("humidity.kitchen", "40"),
    ] {
        publisher.send_frame(topic.as_bytes(), Flag::More)?;
        publisher.send_frame(value.as_bytes(), Flag::None)?;
    }

    for _ in 0..4 {
        let msg = everything.recv_message()?;
        eprintln!("[all] {}", String::from_utf8_lossy(&msg[0]));
    }

    reader
        .join()
        .expect("reader thread should not panic")?;
    Ok(())
}
