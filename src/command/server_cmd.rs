use crate::command::{arg_bytes, wrong_arg_count};
use crate::connection::ClientState;
use crate::error::{BitisError, BitisResult};
use crate::resp::RespValue;
use crate::store::SharedKeyspace;

/// PING [message]
pub fn cmd_ping(args: &[RespValue]) -> BitisResult<RespValue> {
    match args.len() {
        0 => Ok(RespValue::SimpleString("PONG".to_string())),
        1 => Ok(RespValue::bulk_string(arg_bytes(&args[0])?)),
        _ => Err(wrong_arg_count("ping")),
    }
}

/// ECHO message
pub fn cmd_echo(args: &[RespValue]) -> BitisResult<RespValue> {
    if args.len() != 1 {
        return Err(wrong_arg_count("echo"));
    }
    Ok(RespValue::bulk_string(arg_bytes(&args[0])?))
}

/// QUIT
pub fn cmd_quit(client: &mut ClientState) -> BitisResult<RespValue> {
    client.should_close = true;
    Ok(RespValue::ok())
}

/// CLIENT subcommand [args...]: connection metadata, accepted so stock
/// client libraries that announce themselves on connect keep working.
pub fn cmd_client(args: &[RespValue], client: &ClientState) -> BitisResult<RespValue> {
    if args.is_empty() {
        return Err(wrong_arg_count("client"));
    }
    let subcmd = arg_bytes(&args[0])?;

    if subcmd.eq_ignore_ascii_case(b"ID") {
        Ok(RespValue::integer(client.id as i64))
    } else if subcmd.eq_ignore_ascii_case(b"SETNAME") || subcmd.eq_ignore_ascii_case(b"SETINFO") {
        Ok(RespValue::ok())
    } else if subcmd.eq_ignore_ascii_case(b"GETNAME") {
        Ok(RespValue::null_bulk_string())
    } else {
        Err(BitisError::Syntax)
    }
}

/// DBSIZE
pub async fn cmd_dbsize(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if !args.is_empty() {
        return Err(BitisError::WrongArgCount("dbsize".to_string()));
    }
    Ok(RespValue::integer(store.len().await as i64))
}

/// FLUSHALL
pub async fn cmd_flushall(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if !args.is_empty() {
        return Err(BitisError::WrongArgCount("flushall".to_string()));
    }
    store.flush_all().await;
    Ok(RespValue::ok())
}
