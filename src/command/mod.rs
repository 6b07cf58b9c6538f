pub mod bitmap;
pub mod key;
pub mod server_cmd;
pub mod string;

use crate::connection::ClientState;
use crate::error::{BitisError, BitisResult};
use crate::resp::RespValue;
use crate::store::SharedKeyspace;

/// Dispatch a parsed command to its handler.
///
/// Handlers validate and parse every argument before touching the keyspace,
/// acquire their key latches, and return one RESP reply; errors become RESP
/// error frames here.
pub async fn dispatch(
    cmd_name: &str,
    args: &[RespValue],
    store: &SharedKeyspace,
    client: &mut ClientState,
) -> RespValue {
    let result = match cmd_name {
        // Connection
        "PING" => server_cmd::cmd_ping(args),
        "ECHO" => server_cmd::cmd_echo(args),
        "QUIT" => server_cmd::cmd_quit(client),
        "CLIENT" => server_cmd::cmd_client(args, client),
        "DBSIZE" => server_cmd::cmd_dbsize(args, store).await,
        "FLUSHALL" => server_cmd::cmd_flushall(args, store).await,

        // Bits
        "SETBIT" => bitmap::cmd_setbit(args, store).await,
        "GETBIT" => bitmap::cmd_getbit(args, store).await,
        "BITCOUNT" => bitmap::cmd_bitcount(args, store).await,
        "BITPOS" => bitmap::cmd_bitpos(args, store).await,
        "BITOP" => bitmap::cmd_bitop(args, store).await,
        "BITFIELD" => bitmap::cmd_bitfield(args, store).await,
        "BITFIELD_RO" => bitmap::cmd_bitfield_ro(args, store).await,

        // Strings and keys (thin collaborators around the bitmap engine)
        "SET" => string::cmd_set(args, store).await,
        "GET" => string::cmd_get(args, store).await,
        "STRLEN" => string::cmd_strlen(args, store).await,
        "DEL" => key::cmd_del(args, store).await,
        "EXISTS" => key::cmd_exists(args, store).await,

        _ => {
            let preview: Vec<String> = args
                .iter()
                .take(3)
                .filter_map(|a| a.to_string_lossy())
                .map(|s| format!("'{s}'"))
                .collect();
            Err(BitisError::UnknownCommand(
                cmd_name.to_string(),
                preview.join(" "),
            ))
        }
    };

    match result {
        Ok(reply) => reply,
        Err(e) => RespValue::error(e.to_string()),
    }
}

/// Raw bytes of an argument.
pub fn arg_bytes(arg: &RespValue) -> BitisResult<&[u8]> {
    arg.as_bytes().ok_or(BitisError::Syntax)
}

/// Parse an argument as a signed 64-bit integer.
pub fn arg_i64(arg: &RespValue) -> Option<i64> {
    let bytes = arg.as_bytes()?;
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

pub fn wrong_arg_count(cmd: &str) -> BitisError {
    BitisError::WrongArgCount(cmd.to_string())
}
