//! Run-length packing for RLE-compressed scanline blocks.
//!
//! A block is a sequence of packets. The leading byte, read as `i8`,
//! selects the packet kind: a negative value `-n` is followed by `n`
//! literal bytes, a non-negative value `n` is followed by one byte to be
//! repeated `n + 1` times.

/// Shortest run worth a run packet.
const MIN_RUN: usize = 3;
/// Longest run a single packet can carry (`count` saturates at 127).
const RUN_MAX: usize = 128;
/// Longest literal segment a single packet can carry.
const LITERAL_MAX: usize = 127;

/// Packs `data` into RLE packets.
pub(crate) fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / LITERAL_MAX + 1);
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let mut run = 1;
        while i + run < data.len() && data[i + run] == byte && run < RUN_MAX {
            run += 1;
        }
        if run >= MIN_RUN {
            out.push((run - 1) as u8);
            out.push(byte);
            i += run;
        } else {
            let start = i;
            while i < data.len() && i - start < LITERAL_MAX {
                if i + 2 < data.len() && data[i] == data[i + 1] && data[i + 1] == data[i + 2] {
                    break;
                }
                i += 1;
            }
            out.push((start as isize - i as isize) as u8);
            out.extend_from_slice(&data[start..i]);
        }
    }
    out
}

/// Unpacks RLE packets, expecting exactly `expected_len` output bytes.
pub(crate) fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>, &'static str> {
    let mut out = Vec::with_capacity(expected_len);
    let mut i = 0;
    while i < data.len() {
        let count = data[i] as i8;
        i += 1;
        if count < 0 {
            let n = -(count as isize) as usize;
            if i + n > data.len() {
                return Err("RLE literal packet overruns block");
            }
            if out.len() + n > expected_len {
                return Err("RLE output longer than declared");
            }
            out.extend_from_slice(&data[i..i + n]);
            i += n;
        } else {
            let n = count as usize + 1;
            if i >= data.len() {
                return Err("RLE run packet missing value byte");
            }
            if out.len() + n > expected_len {
                return Err("RLE output longer than declared");
            }
            out.resize(out.len() + n, data[i]);
            i += 1;
        }
    }
    if out.len() != expected_len {
        return Err("RLE output shorter than declared");
    }
    Ok(out)
}
