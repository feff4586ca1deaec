#![deny(missing_docs)]

//! Hilbert curve indexing.
//!
//! Maps a point of an `n`-dimensional integer grid with `2^bits` cells per side onto its rank
//! along the Hilbert curve filling that grid. The mapping is John Skilling's transpose
//! formulation ("Programming the Hilbert curve", AIP Conf. Proc. 707, 2004): the axes are first
//! rewritten into the transposed Hilbert form, whose bits are then interleaved most significant
//! first into a single integer.

use tessera_error::{TesseraResult, tessera_bail};

/// The largest number of bits a Hilbert index may occupy.
pub const MAX_INDEX_BITS: u32 = i64::BITS - 1;

/// Returns the rank of `coords` along a Hilbert curve of order `bits` in `coords.len()`
/// dimensions.
///
/// Only the low `bits` bits of every coordinate take part in the mapping, so callers wanting
/// a bijection must pass coordinates in `[0, 2^bits)`. A curve of order zero has a single cell
/// and every point maps to zero.
///
/// Fails if the index would not fit in an `i64`, i.e. if `bits * coords.len()` exceeds
/// [`MAX_INDEX_BITS`].
pub fn hilbert_index(coords: &[i64], bits: u32) -> TesseraResult<i64> {
    let dims = coords.len();
    if dims == 0 {
        tessera_bail!("a Hilbert index needs at least one dimension");
    }
    let total_bits = u64::from(bits) * dims as u64;
    if total_bits > u64::from(MAX_INDEX_BITS) {
        tessera_bail!(
            "Hilbert index of {dims} dimensions at {bits} bits needs {total_bits} bits, at most {MAX_INDEX_BITS} are available"
        );
    }
    if bits == 0 {
        return Ok(0);
    }

    let mask = (1u64 << bits) - 1;
    let mut axes: Vec<u64> = coords.iter().map(|&c| (c as u64) & mask).collect();
    axes_to_transpose(&mut axes, bits);

    let line = transpose_to_line(&axes, bits);
    Ok(i64::try_from(line).unwrap_or(i64::MAX))
}

/// Rewrites `axes` in place into Skilling's transposed Hilbert representation.
fn axes_to_transpose(axes: &mut [u64], bits: u32) {
    let n = axes.len();
    let top = 1u64 << (bits - 1);

    // Inverse undo
    let mut q = top;
    while q > 1 {
        let p = q - 1;
        for i in 0..n {
            if axes[i] & q != 0 {
                axes[0] ^= p;
            } else {
                let t = (axes[0] ^ axes[i]) & p;
                axes[0] ^= t;
                axes[i] ^= t;
            }
        }
        q >>= 1;
    }

    // Gray encode
    for i in 1..n {
        axes[i] ^= axes[i - 1];
    }
    let mut t = 0;
    let mut q = top;
    while q > 1 {
        if axes[n - 1] & q != 0 {
            t ^= q - 1;
        }
        q >>= 1;
    }
    for axis in axes.iter_mut() {
        *axis ^= t;
    }
}

/// Interleaves the transposed form, most significant bit of the first axis first.
fn transpose_to_line(axes: &[u64], bits: u32) -> u64 {
    let mut line = 0u64;
    for bit in (0..bits).rev() {
        for axis in axes {
            line = (line << 1) | ((axis >> bit) & 1);
        }
    }
    line
}
