use crate::command;
use crate::config::SharedConfig;
use crate::connection::ClientState;
use crate::resp::{RespParser, RespValue};
use crate::store::SharedKeyspace;
use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

/// How often the background task sweeps empty key slots.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

pub async fn run_server(store: SharedKeyspace, config: SharedConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Bitis server listening on {addr}");

    // Slots for keys that were touched but hold no value (reads of missing
    // keys, deleted keys) are reclaimed in the background.
    let store_clone = store.clone();
    tokio::spawn(async move {
        slot_sweep_loop(store_clone).await;
    });

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = result?;
                debug!("New connection from {peer_addr}");

                let store = store.clone();
                let config = config.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, store, config).await {
                        debug!("Connection error from {peer_addr}: {e}");
                    }
                    debug!("Connection closed: {peer_addr}");
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                return Ok(());
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    store: SharedKeyspace,
    config: SharedConfig,
) -> std::io::Result<()> {
    let mut client = ClientState::new();
    let mut buf = BytesMut::with_capacity(4096);

    let timeout = if config.timeout > 0 {
        Some(Duration::from_secs(config.timeout))
    } else {
        None
    };

    loop {
        // Drain every complete command already buffered.
        loop {
            match RespParser::parse(&mut buf) {
                Ok(Some(frame)) => {
                    let response = process_command(frame, &store, &mut client).await;
                    let Some(response) = response else {
                        continue; // empty inline line
                    };
                    stream.write_all(&response.serialize()).await?;

                    if client.should_close {
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let err = RespValue::error(format!("ERR Protocol error: {e}"));
                    stream.write_all(&err.serialize()).await?;
                    return Ok(());
                }
            }
        }

        let read = if let Some(dur) = timeout {
            match tokio::time::timeout(dur, stream.read_buf(&mut buf)).await {
                Ok(result) => result,
                Err(_) => Ok(0), // idle timeout closes the connection
            }
        } else {
            stream.read_buf(&mut buf).await
        };

        match read {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) => return Err(e),
        }
    }
}

async fn process_command(
    frame: RespValue,
    store: &SharedKeyspace,
    client: &mut ClientState,
) -> Option<RespValue> {
    let items = match frame {
        RespValue::Array(Some(items)) => {
            if items.is_empty() {
                return None;
            }
            items
        }
        _ => return Some(RespValue::error("ERR invalid command format")),
    };

    let cmd_name = match items[0].to_string_lossy() {
        Some(name) => name.to_uppercase(),
        None => return Some(RespValue::error("ERR invalid command name")),
    };

    Some(command::dispatch(&cmd_name, &items[1..], store, client).await)
}

async fn slot_sweep_loop(store: SharedKeyspace) {
    loop {
        tokio::time::sleep(SWEEP_INTERVAL).await;
        let swept = store.sweep_empty().await;
        if swept > 0 {
            debug!("Swept {swept} empty key slots");
        }
    }
}
