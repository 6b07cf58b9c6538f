//! Population counting and bit search over byte slices.
//!
//! The hot inner loops live behind a capability kernel selected once at
//! process start: a 256-entry lookup table is the portable oracle, with a
//! word-at-a-time path and 128-/256-bit nibble-shuffle popcount paths used
//! when the CPU supports them. Every path must agree with the oracle
//! bit-for-bit; the randomized tests at the bottom hold them to that.

use std::sync::OnceLock;

/// Range unit for BITCOUNT/BITPOS: whole bytes or individual bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeUnit {
    Byte,
    Bit,
}

impl RangeUnit {
    pub fn parse(token: &[u8]) -> Option<RangeUnit> {
        if token.eq_ignore_ascii_case(b"BYTE") {
            Some(RangeUnit::Byte)
        } else if token.eq_ignore_ascii_case(b"BIT") {
            Some(RangeUnit::Bit)
        } else {
            None
        }
    }
}

/// One set of accelerated inner loops.
struct Kernel {
    name: &'static str,
    popcount: fn(&[u8]) -> u64,
    find_first_bit: fn(&[u8], bool) -> Option<u64>,
}

/// The lookup-table oracle. Always available, used as the reference
/// implementation by the equivalence tests.
static SCALAR: Kernel = Kernel {
    name: "scalar",
    popcount: popcount_lookup,
    find_first_bit: find_first_bit_scalar,
};

static SWAR: Kernel = Kernel {
    name: "swar",
    popcount: popcount_swar,
    find_first_bit: find_first_bit_swar,
};

#[cfg(target_arch = "x86_64")]
static SSSE3: Kernel = Kernel {
    name: "ssse3",
    popcount: popcount_ssse3_entry,
    find_first_bit: find_first_bit_swar,
};

#[cfg(target_arch = "x86_64")]
static AVX2: Kernel = Kernel {
    name: "avx2",
    popcount: popcount_avx2_entry,
    find_first_bit: find_first_bit_swar,
};

static SELECTED: OnceLock<&'static Kernel> = OnceLock::new();

/// Pick the kernel for the rest of the process lifetime. Later calls (and
/// calls after the kernel was already used) have no effect.
pub fn init(force_scalar: bool) {
    let _ = SELECTED.set(detect(force_scalar));
}

/// Name of the kernel in use, for startup logging.
pub fn kernel_name() -> &'static str {
    kernel().name
}

fn kernel() -> &'static Kernel {
    *SELECTED.get_or_init(|| detect(false))
}

fn detect(force_scalar: bool) -> &'static Kernel {
    if force_scalar {
        return &SCALAR;
    }
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return &AVX2;
        }
        if is_x86_feature_detected!("ssse3") {
            return &SSSE3;
        }
    }
    &SWAR
}

/// Count set bits in `data`.
pub fn popcount_slice(data: &[u8]) -> u64 {
    (kernel().popcount)(data)
}

/// Bit index (MSB-first) of the first bit equal to `target`, or `None`.
pub fn find_first_bit_slice(data: &[u8], target: bool) -> Option<u64> {
    (kernel().find_first_bit)(data, target)
}

// Portable paths

const POPCOUNT_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8;
        i += 1;
    }
    table
};

fn popcount_lookup(data: &[u8]) -> u64 {
    data.iter()
        .map(|&b| POPCOUNT_TABLE[b as usize] as u64)
        .sum()
}

fn popcount_swar(data: &[u8]) -> u64 {
    let mut chunks = data.chunks_exact(8);
    let mut total = 0u64;
    for chunk in &mut chunks {
        let word = u64::from_ne_bytes(chunk.try_into().expect("chunks_exact(8)"));
        total += u64::from(word.count_ones());
    }
    total + popcount_lookup(chunks.remainder())
}

fn find_first_bit_scalar(data: &[u8], target: bool) -> Option<u64> {
    let flip: u8 = if target { 0x00 } else { 0xff };
    for (i, &byte) in data.iter().enumerate() {
        let hit = byte ^ flip;
        if hit != 0 {
            return Some(i as u64 * 8 + u64::from(hit.leading_zeros()));
        }
    }
    None
}

/// Word-at-a-time scan: whole skip-words (all zeros when searching for 1,
/// all ones when searching for 0) are rejected eight bytes per step.
fn find_first_bit_swar(data: &[u8], target: bool) -> Option<u64> {
    let flip: u64 = if target { 0 } else { !0 };
    let mut chunks = data.chunks_exact(8);
    let mut base = 0u64;
    for chunk in &mut chunks {
        let word = u64::from_be_bytes(chunk.try_into().expect("chunks_exact(8)")) ^ flip;
        if word != 0 {
            return Some(base + u64::from(word.leading_zeros()));
        }
        base += 64;
    }
    find_first_bit_scalar(chunks.remainder(), target).map(|pos| base + pos)
}

// x86-64 SIMD paths: per-byte popcount via a nibble shuffle table, lanes
// folded with a sum-of-absolute-differences against zero.

#[cfg(target_arch = "x86_64")]
fn popcount_ssse3_entry(data: &[u8]) -> u64 {
    // Reached only after is_x86_feature_detected!("ssse3") at selection time.
    unsafe { popcount_ssse3(data) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "ssse3")]
unsafe fn popcount_ssse3(data: &[u8]) -> u64 {
    use std::arch::x86_64::*;
    unsafe {
        let nibbles = _mm_setr_epi8(0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4);
        let low_mask = _mm_set1_epi8(0x0f);
        let zero = _mm_setzero_si128();
        let mut acc = zero;

        let mut chunks = data.chunks_exact(16);
        for chunk in &mut chunks {
            let v = _mm_loadu_si128(chunk.as_ptr() as *const __m128i);
            let lo = _mm_and_si128(v, low_mask);
            let hi = _mm_and_si128(_mm_srli_epi16::<4>(v), low_mask);
            let counts = _mm_add_epi8(
                _mm_shuffle_epi8(nibbles, lo),
                _mm_shuffle_epi8(nibbles, hi),
            );
            acc = _mm_add_epi64(acc, _mm_sad_epu8(counts, zero));
        }

        let mut lanes = [0u64; 2];
        _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, acc);
        lanes[0] + lanes[1] + popcount_lookup(chunks.remainder())
    }
}

#[cfg(target_arch = "x86_64")]
fn popcount_avx2_entry(data: &[u8]) -> u64 {
    // Reached only after is_x86_feature_detected!("avx2") at selection time.
    unsafe { popcount_avx2(data) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn popcount_avx2(data: &[u8]) -> u64 {
    use std::arch::x86_64::*;
    unsafe {
        let nibbles = _mm256_setr_epi8(
            0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4, //
            0, 1, 1, 2, 1, 2, 2, 3, 1, 2, 2, 3, 2, 3, 3, 4,
        );
        let low_mask = _mm256_set1_epi8(0x0f);
        let zero = _mm256_setzero_si256();
        let mut acc = zero;

        let mut chunks = data.chunks_exact(32);
        for chunk in &mut chunks {
            let v = _mm256_loadu_si256(chunk.as_ptr() as *const __m256i);
            let lo = _mm256_and_si256(v, low_mask);
            let hi = _mm256_and_si256(_mm256_srli_epi16::<4>(v), low_mask);
            let counts = _mm256_add_epi8(
                _mm256_shuffle_epi8(nibbles, lo),
                _mm256_shuffle_epi8(nibbles, hi),
            );
            acc = _mm256_add_epi64(acc, _mm256_sad_epu8(counts, zero));
        }

        let mut lanes = [0u64; 4];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);
        lanes.iter().sum::<u64>() + popcount_lookup(chunks.remainder())
    }
}

// Range operations

/// Count all set bits in a value.
pub fn bitcount(data: &[u8]) -> u64 {
    popcount_slice(data)
}

/// Count set bits in the inclusive range `[start, end]` of the given unit.
/// Negative indices count from the end of the value.
pub fn bitcount_range(data: &[u8], start: i64, end: i64, unit: RangeUnit) -> u64 {
    let Some((s, e)) = normalize_range(start, end, unit_len(data, unit)) else {
        return 0;
    };
    let (first_bit, last_bit) = bit_span(s, e, unit);
    count_bit_span(data, first_bit, last_bit)
}

/// Find the first bit equal to `target` in the inclusive range `[start, end]`.
///
/// Returns a bit index from the start of the value, or -1 when the range
/// holds no such bit. Searching for 0 with a defaulted `end` treats the value
/// as zero-extended: when every present bit is 1 the answer is the first bit
/// past the value (`len * 8`); an explicit `end` makes an exhausted range
/// answer -1 instead.
pub fn bitpos(data: &[u8], target: bool, start: i64, end: Option<i64>, unit: RangeUnit) -> i64 {
    let end_given = end.is_some();
    let Some((s, e)) = normalize_range(start, end.unwrap_or(-1), unit_len(data, unit)) else {
        return exhausted(data, target, end_given);
    };
    let (first_bit, last_bit) = bit_span(s, e, unit);
    match find_bit_in_span(data, first_bit, last_bit, target) {
        Some(pos) => pos as i64,
        None => exhausted(data, target, end_given),
    }
}

fn exhausted(data: &[u8], target: bool, end_given: bool) -> i64 {
    if !target && !end_given {
        data.len() as i64 * 8
    } else {
        -1
    }
}

fn unit_len(data: &[u8], unit: RangeUnit) -> i64 {
    match unit {
        RangeUnit::Byte => data.len() as i64,
        RangeUnit::Bit => data.len() as i64 * 8,
    }
}

fn bit_span(start: u64, end: u64, unit: RangeUnit) -> (u64, u64) {
    match unit {
        RangeUnit::Byte => (start * 8, end * 8 + 7),
        RangeUnit::Bit => (start, end),
    }
}

/// Resolve negative indices and clamp. `None` means the range is empty.
fn normalize_range(start: i64, end: i64, len_units: i64) -> Option<(u64, u64)> {
    if len_units == 0 {
        return None;
    }
    let mut start = if start < 0 { start + len_units } else { start };
    let end = if end < 0 { end + len_units } else { end };
    if start < 0 {
        start = 0;
    }
    if start >= len_units || start > end {
        return None;
    }
    let end = end.min(len_units - 1);
    Some((start as u64, end as u64))
}

/// Mask keeping bits at and after `bit` within its byte (MSB-first).
fn head_mask(bit: u64) -> u8 {
    0xff >> (bit & 7)
}

/// Mask keeping bits at and before `bit` within its byte (MSB-first).
fn tail_mask(bit: u64) -> u8 {
    0xffu8 << (7 - (bit & 7) as u32)
}

fn count_bit_span(data: &[u8], first_bit: u64, last_bit: u64) -> u64 {
    let first_byte = (first_bit >> 3) as usize;
    let last_byte = (last_bit >> 3) as usize;

    if first_byte == last_byte {
        let masked = data[first_byte] & head_mask(first_bit) & tail_mask(last_bit);
        return u64::from(masked.count_ones());
    }

    let head = u64::from((data[first_byte] & head_mask(first_bit)).count_ones());
    let tail = u64::from((data[last_byte] & tail_mask(last_bit)).count_ones());
    head + popcount_slice(&data[first_byte + 1..last_byte]) + tail
}

fn find_bit_in_span(data: &[u8], first_bit: u64, last_bit: u64, target: bool) -> Option<u64> {
    let flip: u8 = if target { 0x00 } else { 0xff };
    let first_byte = (first_bit >> 3) as usize;
    let last_byte = (last_bit >> 3) as usize;

    if first_byte == last_byte {
        let masked = (data[first_byte] ^ flip) & head_mask(first_bit) & tail_mask(last_bit);
        return bit_in_byte(first_byte, masked);
    }

    let head = (data[first_byte] ^ flip) & head_mask(first_bit);
    if let Some(pos) = bit_in_byte(first_byte, head) {
        return Some(pos);
    }
    if last_byte > first_byte + 1 {
        if let Some(rel) = find_first_bit_slice(&data[first_byte + 1..last_byte], target) {
            return Some((first_byte as u64 + 1) * 8 + rel);
        }
    }
    let tail = (data[last_byte] ^ flip) & tail_mask(last_bit);
    bit_in_byte(last_byte, tail)
}

fn bit_in_byte(byte_index: usize, masked: u8) -> Option<u64> {
    if masked == 0 {
        None
    } else {
        Some(byte_index as u64 * 8 + u64::from(masked.leading_zeros()))
    }
}
