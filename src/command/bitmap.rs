use crate::bitmap::access;
use crate::bitmap::bitfield::{self, FieldType, Overflow, SubOp};
use crate::bitmap::combine::{self, BitOp};
use crate::bitmap::popcount::{self, RangeUnit};
use crate::command::{arg_bytes, arg_i64, wrong_arg_count};
use crate::error::{BitisError, BitisResult};
use crate::resp::RespValue;
use crate::store::{self, SharedKeyspace};

/// Parse a bit offset argument for SETBIT/GETBIT: a nonnegative integer
/// whose containing byte stays under the value size cap.
fn parse_bit_offset(arg: &RespValue) -> BitisResult<u64> {
    let offset = arg_i64(arg).ok_or(BitisError::BitOffset)?;
    if offset < 0 || (offset as u64 >> 3) >= store::MAX_VALUE_BYTES as u64 {
        return Err(BitisError::BitOffset);
    }
    Ok(offset as u64)
}

/// SETBIT key offset value
pub async fn cmd_setbit(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() != 3 {
        return Err(wrong_arg_count("setbit"));
    }
    let key = arg_bytes(&args[0])?;
    let offset = parse_bit_offset(&args[1])?;
    let bit = match arg_i64(&args[2]) {
        Some(0) => false,
        Some(1) => true,
        _ => return Err(BitisError::BitValue),
    };

    let mut guard = store.acquire(key).await;
    let mut value = guard.bytes().to_vec();
    store::grow_to(&mut value, access::byte_len_for(offset))?;
    let old = access::set_bit(&mut value, offset, bit);
    guard.replace(value);

    Ok(RespValue::integer(i64::from(old)))
}

/// GETBIT key offset
pub async fn cmd_getbit(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() != 2 {
        return Err(wrong_arg_count("getbit"));
    }
    let key = arg_bytes(&args[0])?;
    let offset = parse_bit_offset(&args[1])?;

    let guard = store.acquire(key).await;
    Ok(RespValue::integer(i64::from(access::get_bit(
        guard.bytes(),
        offset,
    ))))
}

/// BITCOUNT key [start end [BYTE|BIT]]
pub async fn cmd_bitcount(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.is_empty() {
        return Err(wrong_arg_count("bitcount"));
    }
    if args.len() == 2 || args.len() > 4 {
        return Err(BitisError::Syntax);
    }
    let key = arg_bytes(&args[0])?;

    let range = if args.len() >= 3 {
        let start = arg_i64(&args[1]).ok_or(BitisError::NotInteger)?;
        let end = arg_i64(&args[2]).ok_or(BitisError::NotInteger)?;
        let unit = if args.len() == 4 {
            RangeUnit::parse(arg_bytes(&args[3])?).ok_or(BitisError::Syntax)?
        } else {
            RangeUnit::Byte
        };
        Some((start, end, unit))
    } else {
        None
    };

    let guard = store.acquire(key).await;
    let count = match range {
        Some((start, end, unit)) => popcount::bitcount_range(guard.bytes(), start, end, unit),
        None => popcount::bitcount(guard.bytes()),
    };
    Ok(RespValue::integer(count as i64))
}

/// BITPOS key bit [start [end [BYTE|BIT]]]
pub async fn cmd_bitpos(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() < 2 || args.len() > 5 {
        return Err(wrong_arg_count("bitpos"));
    }
    let key = arg_bytes(&args[0])?;

    // The unit token is checked before the integer arguments so a trailing
    // garbage token reports a syntax error rather than an integer error.
    let unit = if args.len() == 5 {
        RangeUnit::parse(arg_bytes(&args[4])?).ok_or(BitisError::Syntax)?
    } else {
        RangeUnit::Byte
    };

    let target = match arg_i64(&args[1]) {
        Some(0) => false,
        Some(1) => true,
        Some(_) => return Err(BitisError::BitArgument),
        None => return Err(BitisError::NotInteger),
    };
    let start = if args.len() >= 3 {
        arg_i64(&args[2]).ok_or(BitisError::NotInteger)?
    } else {
        0
    };
    let end = if args.len() >= 4 {
        Some(arg_i64(&args[3]).ok_or(BitisError::NotInteger)?)
    } else {
        None
    };

    let guard = store.acquire(key).await;
    Ok(RespValue::integer(popcount::bitpos(
        guard.bytes(),
        target,
        start,
        end,
        unit,
    )))
}

/// BITOP operation destkey key [key ...]
pub async fn cmd_bitop(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() < 3 {
        return Err(wrong_arg_count("bitop"));
    }
    let op = BitOp::parse(arg_bytes(&args[0])?).ok_or(BitisError::Syntax)?;
    let dest = arg_bytes(&args[1])?;

    let source_keys: Vec<&[u8]> = args[2..]
        .iter()
        .map(arg_bytes)
        .collect::<BitisResult<_>>()?;
    if op.is_unary() && source_keys.len() != 1 {
        return Err(BitisError::BitopNotArity);
    }
    if source_keys.len() > combine::MAX_SOURCES {
        return Err(BitisError::BitopSourceLimit);
    }

    // Latches are taken for destination and sources together, in key order,
    // so concurrent BITOPs over overlapping key sets cannot deadlock.
    let mut all_keys = source_keys.clone();
    all_keys.push(dest);
    let mut guards = store.acquire_many(&all_keys).await;

    let result = {
        let sources: Vec<&[u8]> = source_keys
            .iter()
            .map(|key| {
                guards
                    .get(key)
                    .map(|g| g.bytes())
                    .expect("source latch acquired above")
            })
            .collect();
        combine::apply(op, &sources)
    };

    let written = result.len() as i64;
    if !result.is_empty() {
        guards
            .get_mut(dest)
            .expect("destination latch acquired above")
            .replace(result);
    }
    Ok(RespValue::integer(written))
}

/// Parse the sub-op list of a BITFIELD/BITFIELD_RO call. Any parse error
/// aborts the whole call before a single latch is taken.
fn parse_subops(args: &[RespValue], read_only: bool) -> BitisResult<Vec<SubOp>> {
    let mut ops = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let sub = arg_bytes(&args[i])?;

        if sub.eq_ignore_ascii_case(b"GET") {
            if i + 2 >= args.len() {
                return Err(BitisError::Syntax);
            }
            let ty = parse_type(&args[i + 1])?;
            let offset = bitfield::parse_offset(arg_bytes(&args[i + 2])?, ty)?;
            ops.push(SubOp::Get { ty, offset });
            i += 3;
        } else if !read_only && sub.eq_ignore_ascii_case(b"SET") {
            if i + 3 >= args.len() {
                return Err(BitisError::Syntax);
            }
            let ty = parse_type(&args[i + 1])?;
            let offset = bitfield::parse_offset(arg_bytes(&args[i + 2])?, ty)?;
            let value = arg_i64(&args[i + 3]).ok_or(BitisError::NotInteger)?;
            ops.push(SubOp::Set { ty, offset, value });
            i += 4;
        } else if !read_only && sub.eq_ignore_ascii_case(b"INCRBY") {
            if i + 3 >= args.len() {
                return Err(BitisError::Syntax);
            }
            let ty = parse_type(&args[i + 1])?;
            let offset = bitfield::parse_offset(arg_bytes(&args[i + 2])?, ty)?;
            let delta = arg_i64(&args[i + 3]).ok_or(BitisError::NotInteger)?;
            ops.push(SubOp::IncrBy { ty, offset, delta });
            i += 4;
        } else if !read_only && sub.eq_ignore_ascii_case(b"OVERFLOW") {
            if i + 1 >= args.len() {
                return Err(BitisError::Syntax);
            }
            let policy =
                Overflow::parse(arg_bytes(&args[i + 1])?).ok_or(BitisError::OverflowType)?;
            ops.push(SubOp::Overflow(policy));
            i += 2;
        } else {
            return Err(BitisError::Syntax);
        }
    }
    Ok(ops)
}

fn parse_type(arg: &RespValue) -> BitisResult<FieldType> {
    FieldType::parse(arg_bytes(arg)?).ok_or(BitisError::BitfieldType)
}

fn subop_replies(replies: Vec<Option<i64>>) -> RespValue {
    RespValue::array(
        replies
            .into_iter()
            .map(|reply| match reply {
                Some(n) => RespValue::integer(n),
                None => RespValue::null_bulk_string(),
            })
            .collect(),
    )
}

/// BITFIELD key [GET ty off | SET ty off val | INCRBY ty off delta | OVERFLOW policy] ...
pub async fn cmd_bitfield(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() < 3 {
        return Err(wrong_arg_count("bitfield"));
    }
    let key = arg_bytes(&args[0])?;
    let ops = parse_subops(args, false)?;

    // The latch is held across the whole sub-op sequence: all of it applies
    // atomically, and nothing was written if parsing failed above.
    let mut guard = store.acquire(key).await;
    let mut value = guard.bytes().to_vec();
    let applied = bitfield::execute(&mut value, &ops)?;
    if applied.wrote {
        guard.replace(value);
    }
    Ok(subop_replies(applied.replies))
}

/// BITFIELD_RO key GET ty off [GET ty off ...]
pub async fn cmd_bitfield_ro(args: &[RespValue], store: &SharedKeyspace) -> BitisResult<RespValue> {
    if args.len() < 3 {
        return Err(wrong_arg_count("bitfield_ro"));
    }
    let key = arg_bytes(&args[0])?;
    let ops = parse_subops(args, true)?;

    let guard = store.acquire(key).await;
    let mut value = guard.bytes().to_vec();
    let applied = bitfield::execute(&mut value, &ops)?;
    Ok(subop_replies(applied.replies))
}
