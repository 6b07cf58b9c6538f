//! Minimal string surface: enough to seed and inspect binary values the
//! bitmap engine operates on. No options, no expiry.

use crate::command::{arg_bytes, wrong_arg_count};
use crate::error::BitisResult;
use crate::resp::RespValue;
use crate::store::SharedKeyspace;

/// SET key value
pub async fn cmd_set(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() != 2 {
        return Err(wrong_arg_count("set"));
    }
    let key = arg_bytes(&args[0])?;
    let value = arg_bytes(&args[1])?.to_vec();

    let mut guard = store.acquire(key).await;
    guard.replace(value);
    Ok(RespValue::ok())
}

/// GET key
pub async fn cmd_get(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() != 1 {
        return Err(wrong_arg_count("get"));
    }
    let key = arg_bytes(&args[0])?;

    let guard = store.acquire(key).await;
    if guard.exists() {
        Ok(RespValue::bulk_string(guard.bytes()))
    } else {
        Ok(RespValue::null_bulk_string())
    }
}

/// STRLEN key
pub async fn cmd_strlen(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() != 1 {
        return Err(wrong_arg_count("strlen"));
    }
    let key = arg_bytes(&args[0])?;

    let guard = store.acquire(key).await;
    Ok(RespValue::integer(guard.len() as i64))
}
