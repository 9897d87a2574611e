//! Per-subband coding state: geometry into the owning plane, the bitplane
//! cursor, and the three pixel lists over a shared node arena.

use crate::dwt::Coefficient;
use crate::scan::Scanner;
use crate::utils::error::Result;
use crate::utils::lists::{NodeArena, PixelList};

/// Number of subband orientations per decomposition (LL, HL, LH, HH).
pub const DWT_SUBBANDS: usize = 4;

/// The three position lists of a subband, sharing one arena. Every
/// coefficient position is in exactly one of them at any time.
pub struct SubbandLists {
    pub arena: NodeArena,
    /// List of Insignificant Pixels: all magnitude bits above the current
    /// bitplane are zero
    pub lip: PixelList,
    /// List of Significant Pixels: sign and leading magnitude bit emitted,
    /// only refinement remains
    pub lsp: PixelList,
    /// List of Newly Significant Pixels: promoted during the current sorting
    /// pass, merged into LSP at bitplane end
    pub nsp: PixelList,
}

/// A rectangular frequency region of a DWT-transformed plane.
///
/// `offset` and `stride` address the subband inside its plane's coefficient
/// buffer. Level 0 is the coarsest decomposition; LL exists only there.
#[derive(Default)]
pub struct Subband {
    pub width: usize,
    pub height: usize,
    pub offset: usize,
    pub stride: usize,
    /// Index of the leading magnitude bit of the largest coefficient;
    /// `-1` when the stream ended before it could be read
    pub max_bitplane: i32,
    /// Current bitplane cursor, monotonically non-increasing; the subband is
    /// inert once it reaches zero
    pub bitplane: i32,
    /// Schedule round at which this subband becomes eligible
    pub round: i32,
    /// Lazily built on the first eligible round
    pub lists: Option<Box<SubbandLists>>,
}

impl Subband {
    /// Builds the LIP by walking `scanner` over every position of the
    /// subband, in the order the bitstream contract requires. LSP and NSP
    /// start empty.
    pub fn init_lists(&mut self, scanner: Scanner) -> Result<()> {
        log::trace!(
            "init subband {}x{} (round {})",
            self.width,
            self.height,
            self.round
        );
        let mut arena = NodeArena::with_capacity(self.width * self.height)?;
        let mut lip = PixelList::new();
        for (x, y) in scanner {
            lip.add(&mut arena, x, y);
        }
        self.lists = Some(Box::new(SubbandLists {
            arena,
            lip,
            lsp: PixelList::new(),
            nsp: PixelList::new(),
        }));
        Ok(())
    }

    /// Largest coefficient in the subband. Assumes sign-magnitude form, so
    /// plain comparison stands in for comparing absolute values.
    pub fn max_coefficient(&self, data: &[Coefficient]) -> Coefficient {
        let mut max = data[self.offset];
        for y in 0..self.height {
            let row = self.offset + y * self.stride;
            for x in 0..self.width {
                if data[row + x] > max {
                    max = data[row + x];
                }
            }
        }
        max
    }

    /// Merges the pixels promoted during this bitplane into the LSP, in
    /// promotion order.
    pub fn merge_newly_significant(&mut self) {
        if let Some(lists) = self.lists.as_deref_mut() {
            let SubbandLists {
                arena, lsp, nsp, ..
            } = lists;
            PixelList::merge(arena, nsp, lsp);
        }
    }

    /// Sum of the three list lengths; always `width * height` once the
    /// subband is initialized.
    pub fn tracked_positions(&self) -> usize {
        self.lists
            .as_deref()
            .map(|l| l.lip.length + l.lsp.length + l.nsp.length)
            .unwrap_or(0)
    }
}
