use crate::command::{arg_bytes, wrong_arg_count};
use crate::error::BitisResult;
use crate::resp::RespValue;
use crate::store::SharedKeyspace;

/// DEL key [key ...]
pub async fn cmd_del(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.is_empty() {
        return Err(wrong_arg_count("del"));
    }
    let mut removed = 0i64;
    for arg in args {
        let key = arg_bytes(arg)?;
        let mut guard = store.acquire(key).await;
        if guard.remove() {
            removed += 1;
        }
    }
    Ok(RespValue::integer(removed))
}

/// EXISTS key [key ...]
pub async fn cmd_exists(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.is_empty() {
        return Err(wrong_arg_count("exists"));
    }
    let mut present = 0i64;
    for arg in args {
        let key = arg_bytes(arg)?;
        let guard = store.acquire(key).await;
        if guard.exists() {
            present += 1;
        }
    }
    Ok(RespValue::integer(present))
}
