//! Interactive line client for a running Bitis server.

use bitis::resp::{RespParser, RespValue};
use bytes::BytesMut;
use std::io::{self, BufRead, Write};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> io::Result<()> {
    let mut host = "127.0.0.1".to_string();
    let mut port = 6379u16;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" | "-h" => {
                if i + 1 < args.len() {
                    host = args[i + 1].clone();
                    i += 1;
                }
            }
            "--port" | "-p" => {
                if i + 1 < args.len() {
                    if let Ok(p) = args[i + 1].parse() {
                        port = p;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let addr = format!("{host}:{port}");
    let mut stream = TcpStream::connect(&addr).await?;
    eprintln!("Connected to {addr}");

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        print!("bitis> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let cmd = RespValue::array(
            tokens
                .iter()
                .map(|t| RespValue::bulk_string(t.as_bytes()))
                .collect(),
        );
        stream.write_all(&cmd.serialize()).await?;

        let mut buf = BytesMut::with_capacity(4096);
        loop {
            let n = stream.read_buf(&mut buf).await?;
            if n == 0 {
                eprintln!("Connection closed by server");
                return Ok(());
            }
            match RespParser::parse(&mut buf) {
                Ok(Some(response)) => {
                    print_reply(&response, "");
                    break;
                }
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("Protocol error: {e}");
                    break;
                }
            }
        }

        if line.eq_ignore_ascii_case("QUIT") {
            break;
        }
    }

    Ok(())
}

fn print_reply(value: &RespValue, prefix: &str) {
    match value {
        RespValue::SimpleString(s) => println!("{prefix}{s}"),
        RespValue::Error(s) => println!("{prefix}(error) {s}"),
        RespValue::Integer(n) => println!("{prefix}(integer) {n}"),
        RespValue::BulkString(None) => println!("{prefix}(nil)"),
        RespValue::BulkString(Some(data)) => {
            println!("{prefix}\"{}\"", String::from_utf8_lossy(data));
        }
        RespValue::Array(None) => println!("{prefix}(nil)"),
        RespValue::Array(Some(items)) if items.is_empty() => {
            println!("{prefix}(empty array)");
        }
        RespValue::Array(Some(items)) => {
            for (i, item) in items.iter().enumerate() {
                print_reply(item, &format!("{prefix}{}) ", i + 1));
            }
        }
    }
}
