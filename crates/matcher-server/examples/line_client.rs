//! Interactive line client for poking a running matcher.
//!
//! Reads JSON envelopes from stdin, one per line, and prints any reply
//! lines (cancel rejects, snapshot bodies). Book events go to the
//! multicast feed, not here.

use std::env;
use std::io::{self, BufRead, Write};

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> Result<()> {
    let addr = env::var("MATCHER_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:7700".to_string());

    println!("Connecting to {addr}...");
    let stream = TcpStream::connect(&addr).await?;
    println!("Connected. Send envelopes like:");
    println!(r#"  {{"type":"order","payload":{{"id":"A","sender":"u1","side":0,"price":100,"size":10}}}}"#);
    println!(r#"  {{"type":"cancel","payload":{{"order_id":"A","sender_id":"u1"}}}}"#);
    println!(r#"  {{"type":"state"}}"#);
    println!("Type 'quit' to leave.\n");

    let (read_half, mut write_half) = stream.into_split();

    // Print reply lines as they arrive.
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("<< {line}");
        }
    });

    let stdin = io::stdin();
    loop {
        print!(">> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        write_half.write_all(trimmed.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }

    Ok(())
}
