//! One bitplane of one subband: the WDR-coded sorting pass and the
//! refinement pass.
//!
//! A sorting-pass hit emits `2 | sign` in one or two bits (the leading `1`
//! doubles as the terminator of the previous run), followed by the reduced
//! run bits. The decoder therefore reads a sign, then accumulates run bits
//! until the next `1`. The pass tail is a run of `LIP_remaining + 1`, which
//! walks the decoder off the list end even on a truncated stream.
//!
//! Every I/O is checked; the first failure aborts the pass and the partial
//! state stays consistent up to the last fully received bit.

use crate::dwt::Coefficient;
use crate::utils::bits::{ilog2, interleave_u16, BitReader, BitWriter};
use crate::utils::lists::PixelList;

use super::subband::Subband;

/// Writes the WDR reduction of `run`: its bits below the leading `1`, each
/// preceded by a `0` continuation bit. The terminating `1` is fused into the
/// next emission.
pub(crate) fn write_wdr_run(buffer: &mut BitWriter, run: u32) -> bool {
    let cost = ilog2(run) - 1;
    if cost <= 16 {
        buffer.write_bits(interleave_u16(run), cost * 2)
    } else {
        buffer.write_bits(interleave_u16(run >> 16), (cost - 16) * 2)
            && buffer.write_bits(interleave_u16(run), 32)
    }
}

/// Reads a WDR run. End-of-buffer in a continuation position terminates the
/// run (truncation tolerance); only a missing data bit is a failure.
pub(crate) fn read_wdr_run(buffer: &mut BitReader) -> Option<u32> {
    let mut run = 1u32;
    while buffer.read_bit() == Some(0) {
        let bit = buffer.read_bit()?;
        // corrupted streams can feed arbitrarily long runs; wrap like the
        // 32-bit accumulator the format assumes
        run = run.wrapping_add(run).wrapping_add(bit);
    }
    Some(run)
}

/// Sorting pass, encode side: walk the LIP in order, emit a run + sign for
/// every coefficient whose bit at the current bitplane is set, and promote
/// it to the NSP.
pub(crate) fn encode_sorting_pass(
    band: &mut Subband,
    data: &[Coefficient],
    buffer: &mut BitWriter,
) -> bool {
    let Some(lists) = band.lists.as_deref_mut() else {
        return true;
    };
    if lists.lip.length == 0 || band.bitplane <= 0 {
        return true;
    }
    let mask = 1i32 << band.bitplane;
    let offset = band.offset;
    let stride = band.stride;
    let mut pixel = lists.lip.head;
    let mut previous = crate::utils::lists::LIST_NULL;
    let mut i = 1u32;
    let mut last = 0u32;
    while pixel >= 0 {
        let (x, y) = lists.arena.xy(pixel);
        let v = data[offset + y as usize * stride + x as usize] as i32;
        if v & mask != 0 {
            if !buffer.write_bits(2 | (v & 1) as u32, 1 + (last != 0) as u32)
                || !write_wdr_run(buffer, i - last)
            {
                break;
            }
            last = i;
            pixel = PixelList::exchange(&mut lists.arena, &mut lists.lip, &mut lists.nsp, pixel, previous);
        } else {
            previous = pixel;
            pixel = lists.arena.next(pixel);
        }
        i += 1;
    }
    // WDR termination: run off the end of the list, then a final marker
    buffer.write_bits(3, 1 + (lists.nsp.length > 0) as u32);
    write_wdr_run(buffer, i - last);
    buffer.write_bit(1);
    !buffer.eob()
}

/// Sorting pass, decode side: mirror of the encoder, reproducing the same
/// LIP walk and promotions.
pub(crate) fn decode_sorting_pass(
    band: &mut Subband,
    data: &mut [Coefficient],
    buffer: &mut BitReader,
) -> bool {
    let Some(lists) = band.lists.as_deref_mut() else {
        return true;
    };
    if lists.lip.length == 0 || band.bitplane <= 0 {
        return true;
    }
    let mask = 1i32 << band.bitplane;
    let offset = band.offset;
    let stride = band.stride;
    let mut pixel = lists.lip.head;
    let mut previous = crate::utils::lists::LIST_NULL;
    loop {
        let Some(sign) = buffer.read_bit() else {
            break;
        };
        let Some(mut run) = read_wdr_run(buffer) else {
            break;
        };
        run = run.wrapping_sub(1);
        while run > 0 && pixel >= 0 {
            previous = pixel;
            pixel = lists.arena.next(pixel);
            run -= 1;
        }
        if pixel < 0 {
            break;
        }
        let (x, y) = lists.arena.xy(pixel);
        data[offset + y as usize * stride + x as usize] |= (mask | sign as i32) as i16;
        pixel = PixelList::exchange(&mut lists.arena, &mut lists.lip, &mut lists.nsp, pixel, previous);
    }
    !buffer.eob()
}

/// Refinement pass, encode side: one bit per LSP member, the bit of its
/// coefficient at the current bitplane, in LSP order.
pub(crate) fn encode_refinement_pass(
    band: &mut Subband,
    data: &[Coefficient],
    buffer: &mut BitWriter,
) -> bool {
    let Some(lists) = band.lists.as_deref_mut() else {
        return true;
    };
    let mut pixel = lists.lsp.head;
    if pixel < 0 {
        return !buffer.eob();
    }
    let mask = 1i32 << band.bitplane;
    while pixel >= 0 {
        let (x, y) = lists.arena.xy(pixel);
        let v = data[band.offset + y as usize * band.stride + x as usize] as i32;
        if !buffer.write_bit((v & mask != 0) as u32) {
            break;
        }
        pixel = lists.arena.next(pixel);
    }
    !buffer.eob()
}

/// Refinement pass, decode side: OR each received bit into the coefficient
/// at the current bitplane.
pub(crate) fn decode_refinement_pass(
    band: &mut Subband,
    data: &mut [Coefficient],
    buffer: &mut BitReader,
) -> bool {
    let Some(lists) = band.lists.as_deref_mut() else {
        return true;
    };
    let mut pixel = lists.lsp.head;
    if pixel < 0 {
        return !buffer.eob();
    }
    let mask = 1i32 << band.bitplane;
    while pixel >= 0 {
        match buffer.read_bit() {
            Some(0) => {}
            Some(_) => {
                let (x, y) = lists.arena.xy(pixel);
                data[band.offset + y as usize * band.stride + x as usize] |= mask as i16;
            }
            None => break,
        }
        pixel = lists.arena.next(pixel);
    }
    !buffer.eob()
}

/// One full bitplane on the encode side: sorting, refinement, NSP merge,
/// cursor decrement. Returns `false` when the budget ran out.
pub(crate) fn encode_bitplane(
    band: &mut Subband,
    data: &[Coefficient],
    buffer: &mut BitWriter,
) -> bool {
    if !encode_sorting_pass(band, data, buffer) || !encode_refinement_pass(band, data, buffer) {
        return false;
    }
    band.merge_newly_significant();
    band.bitplane -= (band.bitplane > 0) as i32;
    !buffer.eob()
}

/// One full bitplane on the decode side.
pub(crate) fn decode_bitplane(
    band: &mut Subband,
    data: &mut [Coefficient],
    buffer: &mut BitReader,
) -> bool {
    if !decode_sorting_pass(band, data, buffer) || !decode_refinement_pass(band, data, buffer) {
        return false;
    }
    band.merge_newly_significant();
    band.bitplane -= (band.bitplane > 0) as i32;
    !buffer.eob()
}
