//! Scanline filtering.
//!
//! Filters operate bytewise with wrapping arithmetic. The left-neighbor
//! distance is one byte for sub-byte depths, otherwise the whole-byte
//! pixel size.

pub(crate) const FILTER_NONE: u8 = 0;
pub(crate) const FILTER_SUB: u8 = 1;
pub(crate) const FILTER_UP: u8 = 2;
pub(crate) const FILTER_AVERAGE: u8 = 3;
pub(crate) const FILTER_PAETH: u8 = 4;

const ALL_FILTERS: [u8; 5] = [
    FILTER_NONE,
    FILTER_SUB,
    FILTER_UP,
    FILTER_AVERAGE,
    FILTER_PAETH,
];

/// Reverses `kind` in place. `prev` is the reconstructed row above,
/// zeroed for the first row of a pass.
pub(crate) fn unfilter(
    kind: u8,
    row: &mut [u8],
    prev: &[u8],
    unit: usize,
) -> Result<(), &'static str> {
    match kind {
        FILTER_NONE => {}
        FILTER_SUB => {
            for i in unit..row.len() {
                row[i] = row[i].wrapping_add(row[i - unit]);
            }
        }
        FILTER_UP => {
            for (cur, &above) in row.iter_mut().zip(prev) {
                *cur = cur.wrapping_add(above);
            }
        }
        FILTER_AVERAGE => {
            for i in 0..row.len() {
                let left = if i >= unit { row[i - unit] as u16 } else { 0 };
                let above = prev[i] as u16;
                row[i] = row[i].wrapping_add(((left + above) / 2) as u8);
            }
        }
        FILTER_PAETH => {
            for i in 0..row.len() {
                let left = if i >= unit { row[i - unit] } else { 0 };
                let corner = if i >= unit { prev[i - unit] } else { 0 };
                row[i] = row[i].wrapping_add(paeth_predict(left, prev[i], corner));
            }
        }
        _ => return Err("unknown filter type"),
    }
    Ok(())
}

/// Applies `kind` to `row`, appending the filtered bytes to `out`.
///
/// `kind` must be one of the five wire filter codes.
pub(crate) fn apply(kind: u8, row: &[u8], prev: &[u8], unit: usize, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(row.len());
    match kind {
        FILTER_NONE => out.extend_from_slice(row),
        FILTER_SUB => {
            for i in 0..row.len() {
                let left = if i >= unit { row[i - unit] } else { 0 };
                out.push(row[i].wrapping_sub(left));
            }
        }
        FILTER_UP => {
            for (i, &cur) in row.iter().enumerate() {
                out.push(cur.wrapping_sub(prev[i]));
            }
        }
        FILTER_AVERAGE => {
            for i in 0..row.len() {
                let left = if i >= unit { row[i - unit] as u16 } else { 0 };
                let above = prev[i] as u16;
                out.push(row[i].wrapping_sub(((left + above) / 2) as u8));
            }
        }
        FILTER_PAETH => {
            for i in 0..row.len() {
                let left = if i >= unit { row[i - unit] } else { 0 };
                let corner = if i >= unit { prev[i - unit] } else { 0 };
                out.push(row[i].wrapping_sub(paeth_predict(left, prev[i], corner)));
            }
        }
        _ => unreachable!(),
    }
}

/// Picks the filter with the smallest sum of absolute signed residuals.
///
/// Ties go to the earlier filter code. `scratch` is reused between rows
/// and left holding the residuals of whichever candidate ran last.
pub(crate) fn choose(row: &[u8], prev: &[u8], unit: usize, scratch: &mut Vec<u8>) -> u8 {
    let mut best = FILTER_NONE;
    let mut best_score = u64::MAX;
    for kind in ALL_FILTERS {
        apply(kind, row, prev, unit, scratch);
        let score: u64 = scratch
            .iter()
            .map(|&b| (b as i8).unsigned_abs() as u64)
            .sum();
        if score < best_score {
            best_score = score;
            best = kind;
        }
    }
    best
}

/// Predicts from the left, above and upper-left neighbors, preferring
/// left, then above, on ties.
pub(crate) fn paeth_predict(left: u8, above: u8, corner: u8) -> u8 {
    let p = left as i16 + above as i16 - corner as i16;
    let pa = (p - left as i16).abs();
    let pb = (p - above as i16).abs();
    let pc = (p - corner as i16).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        corner
    }
}
