//! The static schedule table and the round scheduler shared by encode and
//! decode.
//!
//! The table assigns each (color mode, plane, level, orientation) a starting
//! round; the scheduler serves lower rounds first, visiting subbands in a
//! fixed traversal. Ordering is how the decoder knows which bits belong to
//! which subband at which bitplane without any delimiters, so the table and
//! traversal are bitstream contract and must never change.

use crate::codec::bitplane;
use crate::codec::context::CodecContext;
use crate::codec::subband::{Subband, DWT_SUBBANDS};
use crate::dwt::Coefficient;
use crate::scan::{ScanOrder, Scanner};
use crate::utils::bits::{ilog2, BitReader, BitWriter};
use crate::utils::error::Result;
use crate::DWT_MAX_LEVEL;

const SPECTRAL_PLANES: usize = 3;
const COLOR_MODES: usize = 4;

/// Starting round for each subband, per level (0 = coarsest), plane and
/// color mode. Chroma planes additionally start one round later when
/// subsampling is set.
#[rustfmt::skip]
pub(crate) const SCHEDULE: [[[[u8; DWT_SUBBANDS]; DWT_MAX_LEVEL]; SPECTRAL_PLANES]; COLOR_MODES] = [
    // Grayscale
    [
        [
            [0, 1, 1, 2],
            [0, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
        ],
        [[0; DWT_SUBBANDS]; DWT_MAX_LEVEL],
        [[0; DWT_SUBBANDS]; DWT_MAX_LEVEL],
    ],
    // YCoCg-R
    [
        [
            [0, 1, 1, 2],
            [0, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
    ],
    // Oklab
    [
        [
            [0, 1, 1, 2],
            [0, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
    ],
    // logl1
    [
        [
            [0, 1, 1, 2],
            [0, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
        [
            [1, 2, 2, 3],
            [0, 3, 3, 4],
            [0, 4, 4, 5],
            [0, 5, 5, 6],
            [0, 6, 6, 7],
            [0, 7, 7, 8],
            [0, 8, 8, 9],
            [0, 9, 9, 10],
        ],
    ],
];

/// Direction-specific half of the scheduler: how a subband is initialized on
/// first eligibility and how one bitplane of it is coded.
pub(crate) trait BitplaneIo {
    fn eob(&self) -> bool;
    fn init_subband(
        &mut self,
        band: &mut Subband,
        data: &mut [Coefficient],
        order: ScanOrder,
    ) -> Result<()>;
    /// Returns `false` when the budget ran out mid-pass.
    fn code_bitplane(&mut self, band: &mut Subband, data: &mut [Coefficient]) -> bool;
}

pub(crate) struct EncodeIo<'w, 'b> {
    pub buffer: &'w mut BitWriter<'b>,
}

impl BitplaneIo for EncodeIo<'_, '_> {
    fn eob(&self) -> bool {
        self.buffer.eob()
    }

    fn init_subband(
        &mut self,
        band: &mut Subband,
        data: &mut [Coefficient],
        order: ScanOrder,
    ) -> Result<()> {
        band.init_lists(Scanner::new(order, band.width, band.height))?;
        band.max_bitplane = ilog2((band.max_coefficient(data) as u32) >> 1) as i32;
        band.bitplane = band.max_bitplane;
        self.buffer.write_bits(band.max_bitplane as u32, 4);
        Ok(())
    }

    fn code_bitplane(&mut self, band: &mut Subband, data: &mut [Coefficient]) -> bool {
        bitplane::encode_bitplane(band, data, self.buffer)
    }
}

pub(crate) struct DecodeIo<'r, 'b> {
    pub buffer: &'r mut BitReader<'b>,
}

impl BitplaneIo for DecodeIo<'_, '_> {
    fn eob(&self) -> bool {
        self.buffer.eob()
    }

    fn init_subband(
        &mut self,
        band: &mut Subband,
        data: &mut [Coefficient],
        order: ScanOrder,
    ) -> Result<()> {
        let _ = data;
        band.init_lists(Scanner::new(order, band.width, band.height))?;
        band.max_bitplane = match self.buffer.read_bits(4) {
            Some(v) => v as i32,
            None => -1,
        };
        band.bitplane = band.max_bitplane;
        Ok(())
    }

    fn code_bitplane(&mut self, band: &mut Subband, data: &mut [Coefficient]) -> bool {
        bitplane::decode_bitplane(band, data, self.buffer)
    }
}

/// Traversal of the subband tree within one round: all of plane 0 (level
/// ascending from the coarsest, orientations 0..3, LL only at level 0), then
/// the chroma planes interleaved per (level, orientation) slot.
pub(crate) fn visit_order(num_planes: usize, levels: usize) -> Vec<(usize, usize, usize)> {
    let mut order = Vec::new();
    for level in 0..levels {
        for orientation in (level > 0) as usize..DWT_SUBBANDS {
            order.push((0, level, orientation));
        }
    }
    if num_planes > 1 {
        for level in 0..levels {
            for orientation in (level > 0) as usize..DWT_SUBBANDS {
                for plane in 1..num_planes {
                    order.push((plane, level, orientation));
                }
            }
        }
    }
    order
}

/// Round-robin scheduler: serves every subband whose round has arrived, one
/// bitplane per visit, until all are exhausted or the budget is hit. Budget
/// exhaustion is a normal return; the partial stream is valid.
pub(crate) fn run<Io: BitplaneIo>(ctx: &mut CodecContext, io: &mut Io) -> Result<()> {
    let plane_len = ctx.image.width * ctx.image.height;
    let order = visit_order(ctx.image.num_planes(), ctx.image.dwt_levels);
    let scan_order = ctx.image.scan_order;
    let mut round = 0i32;
    let mut done = false;
    while !done && !io.eob() {
        done = true;
        for &(plane, level, orientation) in &order {
            let band = &mut ctx.planes[plane].bands[level][orientation];
            let data = &mut ctx.data[plane * plane_len..(plane + 1) * plane_len];
            if round < band.round || (round > band.round && band.bitplane == 0) {
                done &= round > band.round;
            } else {
                if band.round == round {
                    io.init_subband(band, data, scan_order)?;
                }
                if !io.code_bitplane(band, data) {
                    log::debug!("budget exhausted in round {round}");
                    return Ok(());
                }
                done &= band.bitplane == 0;
            }
        }
        round += 1;
    }
    log::debug!("schedule complete after {round} rounds");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_serves_coarse_before_fine() {
        for mode in 0..COLOR_MODES {
            // the coarsest LL of the luma plane always opens the stream
            assert_eq!(SCHEDULE[mode][0][0][0], 0);
            for plane in 0..SPECTRAL_PLANES {
                for level in 0..DWT_MAX_LEVEL - 1 {
                    for orientation in 1..DWT_SUBBANDS {
                        assert!(
                            SCHEDULE[mode][plane][level][orientation]
                                <= SCHEDULE[mode][plane][level + 1][orientation],
                            "finer levels never precede coarser ones"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_visit_order_grayscale() {
        let order = visit_order(1, 2);
        assert_eq!(
            order,
            vec![
                (0, 0, 0),
                (0, 0, 1),
                (0, 0, 2),
                (0, 0, 3),
                (0, 1, 1),
                (0, 1, 2),
                (0, 1, 3),
            ]
        );
    }

    #[test]
    fn test_visit_order_interleaves_chroma_planes() {
        let order = visit_order(3, 1);
        assert_eq!(
            order,
            vec![
                (0, 0, 0),
                (0, 0, 1),
                (0, 0, 2),
                (0, 0, 3),
                (1, 0, 0),
                (2, 0, 0),
                (1, 0, 1),
                (2, 0, 1),
                (1, 0, 2),
                (2, 0, 2),
                (1, 0, 3),
                (2, 0, 3),
            ]
        );
    }

    #[test]
    fn test_visit_order_skips_ll_above_coarsest_level() {
        for (_, level, orientation) in visit_order(3, 8) {
            assert!(level == 0 || orientation != 0);
        }
        // every coded subband appears exactly once
        let order = visit_order(3, 8);
        let mut seen = std::collections::HashSet::new();
        for entry in &order {
            assert!(seen.insert(*entry));
        }
        assert_eq!(order.len(), 3 * (4 + 7 * 3));
    }
}
