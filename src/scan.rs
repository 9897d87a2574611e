//! Spatial scan orders over a rectangular subband.
//!
//! All four orders yield every position of a `width x height` rectangle
//! exactly once, in an ordering that depends only on the dimensions. The
//! decoder rebuilds each subband's candidate list by replaying the same
//! order, so determinism here is part of the bitstream contract.

use crate::utils::bits::{deinterleave_u16, ilog2};

/// Scan order selector, encoded as a 2-bit header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Row-major, left-to-right, top-to-bottom
    Raster = 0,
    /// Boustrophedon tile traversal; successive positions always differ by a
    /// Manhattan distance of exactly 1
    Snake = 1,
    /// Z-order by bit deinterleaving, excess high bits routed to the long axis
    Morton = 2,
    /// Generalized Hilbert curve for arbitrary rectangles
    Hilbert = 3,
}

impl ScanOrder {
    /// Decodes the 2-bit header field. Every field value is a valid order.
    pub fn from_bits(bits: u32) -> ScanOrder {
        match bits & 3 {
            0 => ScanOrder::Raster,
            1 => ScanOrder::Snake,
            2 => ScanOrder::Morton,
            _ => ScanOrder::Hilbert,
        }
    }
}

/// Iterator over the positions of a rectangle in a chosen [`ScanOrder`].
pub struct Scanner {
    kind: ScanKind,
    first: bool,
}

enum ScanKind {
    Raster(RasterScan),
    Snake(SnakeScan),
    Morton(MortonScan),
    Hilbert(HilbertScan),
}

impl Scanner {
    /// Creates a scanner positioned on the first cell of the rectangle.
    /// `width` and `height` must both be non-zero.
    pub fn new(order: ScanOrder, width: usize, height: usize) -> Scanner {
        let kind = match order {
            ScanOrder::Raster => ScanKind::Raster(RasterScan::new(width, height)),
            ScanOrder::Snake => ScanKind::Snake(SnakeScan::new(width, height)),
            ScanOrder::Morton => ScanKind::Morton(MortonScan::new(width, height)),
            ScanOrder::Hilbert => ScanKind::Hilbert(HilbertScan::new(width, height)),
        };
        Scanner { kind, first: true }
    }

    fn current_pos(&self) -> (u16, u16) {
        let (x, y) = match &self.kind {
            ScanKind::Raster(s) => (s.x, s.y),
            ScanKind::Snake(s) => (s.x, s.y),
            ScanKind::Morton(s) => (s.x, s.y),
            ScanKind::Hilbert(s) => (s.x, s.y),
        };
        (x as u16, y as u16)
    }

    fn advance(&mut self) -> bool {
        match &mut self.kind {
            ScanKind::Raster(s) => s.advance(),
            ScanKind::Snake(s) => s.advance(),
            ScanKind::Morton(s) => s.advance(),
            ScanKind::Hilbert(s) => s.advance(),
        }
    }
}

impl Iterator for Scanner {
    type Item = (u16, u16);

    fn next(&mut self) -> Option<(u16, u16)> {
        if self.first {
            self.first = false;
            return Some(self.current_pos());
        }
        if self.advance() {
            Some(self.current_pos())
        } else {
            None
        }
    }
}

struct RasterScan {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl RasterScan {
    fn new(width: usize, height: usize) -> Self {
        RasterScan {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    fn advance(&mut self) -> bool {
        self.x += 1;
        if self.x >= self.width {
            self.x = 0;
            self.y += 1;
            if self.y >= self.height {
                return false;
            }
        }
        true
    }
}

const SNAKE_DEFAULT_TILE_WIDTH: usize = 4;
const SNAKE_DEFAULT_TILE_HEIGHT: usize = 15;

/// Snake scan state.
///
/// The rectangle is tiled into a grid whose column count is forced odd (and
/// whose remainder tile row is forced to odd height), so the serpentine
/// traversal between tiles and within tiles always continues from where the
/// previous tile left off. This is the only order guaranteeing that
/// successive positions are Manhattan-adjacent.
struct SnakeScan {
    x: usize,
    y: usize,
    // position inside the current tile
    tile_x: usize,
    tile_y: usize,
    tile_width: usize,
    tile_height: usize,
    right_to_left: bool,
    // geometry of the tile grid
    grid_x: usize,
    grid_y: usize,
    grid_width: usize,
    grid_height: usize,
    grid_column_index: usize,
    grid_column_odd: bool,
    grid_row_odd: bool,
    // default tile size and the sizes of the remainder column/row
    default_tile_width: usize,
    default_tile_height: usize,
    remaining_width: usize,
    remaining_height: usize,
    // origin of the current tile
    offset_x: usize,
    offset_y: usize,
}

/// Applies one `+-step` adjustment with the same clamping the tile-geometry
/// search uses: below zero wraps to the upper bound, zero becomes one.
fn snake_adjust(value: usize, step: i64, bound: usize) -> usize {
    let next = value as i64 + step;
    if next < 0 || next as usize > bound {
        bound
    } else if next == 0 {
        1
    } else {
        next as usize
    }
}

impl SnakeScan {
    fn new(width: usize, height: usize) -> Self {
        let mut tile_width = SNAKE_DEFAULT_TILE_WIDTH.min(width);
        let mut tile_height = SNAKE_DEFAULT_TILE_HEIGHT.min(height);

        // grow the tile width by +-1 alternately until the grid column count
        // is odd
        let mut step = 1i64;
        let grid_width = loop {
            let grid_width = (width + tile_width - 1) / tile_width;
            if grid_width & 1 == 1 {
                break grid_width;
            }
            tile_width = snake_adjust(tile_width, step, width);
            step = -(step.abs() + 1) * step.signum();
        };
        let mut remaining_width = width % tile_width;
        if remaining_width == 0 {
            remaining_width = tile_width;
        }

        // grow the tile height by +-2 alternately until the remainder row of
        // tiles has an odd height
        let mut step = 2i64;
        let remaining_height = loop {
            let remainder = height % tile_height;
            if remainder > 0 && remainder & 1 == 0 {
                tile_height = snake_adjust(tile_height, step, height);
                step = -(step.abs() + 2) * step.signum();
            } else if remainder == 0 {
                break tile_height;
            } else {
                break remainder;
            }
        };
        let grid_height = (height + tile_height - 1) / tile_height;

        SnakeScan {
            x: 0,
            y: 0,
            tile_x: 0,
            tile_y: 0,
            tile_width: if grid_width > 1 { tile_width } else { remaining_width },
            tile_height: if grid_height > 1 { tile_height } else { remaining_height },
            right_to_left: false,
            grid_x: 0,
            grid_y: 0,
            grid_width,
            grid_height,
            grid_column_index: 0,
            grid_column_odd: false,
            grid_row_odd: false,
            default_tile_width: tile_width,
            default_tile_height: tile_height,
            remaining_width,
            remaining_height,
            offset_x: 0,
            offset_y: 0,
        }
    }

    fn advance(&mut self) -> bool {
        self.tile_x += 1;
        if self.tile_x >= self.tile_width {
            self.tile_x = 0;
            self.tile_y += 1;
            if self.tile_y >= self.tile_height {
                self.tile_y = 0;
                self.grid_column_index += 1;
                if self.grid_column_index >= self.grid_width {
                    self.grid_column_index = 0;
                    self.grid_y += 1;
                    if self.grid_y >= self.grid_height {
                        return false;
                    }
                    self.grid_row_odd = self.grid_y & 1 == 1;
                    self.tile_height = if self.grid_y < self.grid_height - 1 {
                        self.default_tile_height
                    } else {
                        self.remaining_height
                    };
                    self.offset_y = self.grid_y * self.default_tile_height;
                }
                // enter the next tile of this grid row
                let last_column = self.grid_width - 1;
                self.grid_x = if self.grid_row_odd {
                    last_column - self.grid_column_index
                } else {
                    self.grid_column_index
                };
                self.grid_column_odd = self.grid_x & 1 == 1;
                self.tile_width = if self.grid_x < last_column {
                    self.default_tile_width
                } else {
                    self.remaining_width
                };
                self.offset_x = self.grid_x * self.default_tile_width;
            }
            // enter the next row within the tile
            let row = if self.grid_column_odd {
                self.tile_height - 1 - self.tile_y
            } else {
                self.tile_y
            };
            self.right_to_left = (self.grid_y ^ row) & 1 == 1;
        }
        self.x = self.offset_x
            + if self.right_to_left {
                self.tile_width - 1 - self.tile_x
            } else {
                self.tile_x
            };
        self.y = self.offset_y
            + if self.grid_column_odd {
                self.tile_height - 1 - self.tile_y
            } else {
                self.tile_y
            };
        true
    }
}

/// Morton (Z-order) scan state.
///
/// The low `2r` bits of the running index (where `r` covers the shorter
/// axis) deinterleave into `(x, y)`; the remaining high bits are routed to
/// the longer axis. Indices whose position falls outside the rectangle are
/// skipped.
struct MortonScan {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    range: u32,
    mask: u64,
    index: u64,
    length: u64,
}

impl MortonScan {
    fn new(width: usize, height: usize) -> Self {
        let (short, long) = if width > height {
            (height, width)
        } else {
            (width, height)
        };
        let range = ilog2(short as u32 - 1);
        MortonScan {
            x: 0,
            y: 0,
            width,
            height,
            range,
            mask: (1u64 << (range * 2)) - 1,
            index: 0,
            length: 1u64 << (range + ilog2(long as u32 - 1)),
        }
    }

    fn advance(&mut self) -> bool {
        loop {
            self.index += 1;
            let index = self.index;
            self.x = deinterleave_u16((index & self.mask) as u32) as usize;
            self.y = deinterleave_u16(((index >> 1) & self.mask) as u32) as usize;
            let spill = ((index & !self.mask) >> self.range) as usize;
            if self.width > self.height {
                self.x |= spill;
            } else {
                self.y |= spill;
            }
            if self.x < self.width && self.y < self.height {
                return true;
            }
            if self.index >= self.length {
                return false;
            }
        }
    }
}

/// One pending sub-rectangle of the generalized Hilbert traversal:
/// origin plus the two (signed, axis-aligned) basis vectors.
#[derive(Debug, Clone, Copy)]
struct HilbertFrame {
    x: i32,
    y: i32,
    ax: i32,
    ay: i32,
    bx: i32,
    by: i32,
}

/// Generalized Hilbert scan over arbitrary rectangles, after Jakub Cerveny's
/// gilbert curve. Iterative, with an explicit subdivision stack.
struct HilbertScan {
    x: usize,
    y: usize,
    stack: Vec<HilbertFrame>,
    width: i32,
    height: i32,
    dax: i32,
    day: i32,
    dbx: i32,
    dby: i32,
    index: i32,
}

impl HilbertScan {
    fn new(width: usize, height: usize) -> Self {
        let mut scan = HilbertScan {
            x: 0,
            y: 0,
            stack: Vec::with_capacity(32),
            width: 0,
            height: 0,
            dax: 0,
            day: 0,
            dbx: 0,
            dby: 0,
            index: -1,
        };
        // traverse the long axis first
        let (w, h) = (width as i32, height as i32);
        if width >= height {
            scan.stack.push(HilbertFrame {
                x: 0,
                y: 0,
                ax: w,
                ay: 0,
                bx: 0,
                by: h,
            });
        } else {
            scan.stack.push(HilbertFrame {
                x: 0,
                y: 0,
                ax: 0,
                ay: h,
                bx: w,
                by: 0,
            });
        }
        scan.advance();
        scan
    }

    fn advance(&mut self) -> bool {
        loop {
            let Some(&item) = self.stack.last() else {
                return false;
            };
            if self.index < 0 {
                self.width = (item.ax + item.ay).abs();
                self.height = (item.bx + item.by).abs();
                self.dax = item.ax.signum();
                self.day = item.ay.signum();
                self.dbx = item.bx.signum();
                self.dby = item.by.signum();
                self.index = 0;
            }
            if self.height == 1 {
                // single row: walk along the A axis
                if self.index < self.width {
                    let top = self.stack.last_mut().expect("frame present");
                    self.x = top.x as usize;
                    self.y = top.y as usize;
                    top.x += self.dax;
                    top.y += self.day;
                    self.index += 1;
                    return true;
                }
                self.stack.pop();
                self.index = -1;
                continue;
            }
            if self.width == 1 {
                // single column: walk along the B axis
                if self.index < self.height {
                    let top = self.stack.last_mut().expect("frame present");
                    self.x = top.x as usize;
                    self.y = top.y as usize;
                    top.x += self.dbx;
                    top.y += self.dby;
                    self.index += 1;
                    return true;
                }
                self.stack.pop();
                self.index = -1;
                continue;
            }
            let current = self.stack.pop().expect("frame present");
            self.index = -1;
            let mut ax2 = current.ax / 2;
            let mut ay2 = current.ay / 2;
            let mut bx2 = current.bx / 2;
            let mut by2 = current.by / 2;
            let w2 = (ax2 + ay2).abs();
            let h2 = (bx2 + by2).abs();
            if 2 * self.width > 3 * self.height {
                // wide case: split into two pieces along A, keeping the
                // outer split dimension even
                if w2 % 2 != 0 && self.width > 2 {
                    ax2 += self.dax;
                    ay2 += self.day;
                }
                self.stack.push(HilbertFrame {
                    x: current.x + ax2,
                    y: current.y + ay2,
                    ax: current.ax - ax2,
                    ay: current.ay - ay2,
                    bx: current.bx,
                    by: current.by,
                });
                self.stack.push(HilbertFrame {
                    x: current.x,
                    y: current.y,
                    ax: ax2,
                    ay: ay2,
                    bx: current.bx,
                    by: current.by,
                });
            } else {
                // standard case: three pieces along B
                if h2 % 2 != 0 && self.height > 2 {
                    bx2 += self.dbx;
                    by2 += self.dby;
                }
                self.stack.push(HilbertFrame {
                    x: current.x + (current.ax - self.dax) + (bx2 - self.dbx),
                    y: current.y + (current.ay - self.day) + (by2 - self.dby),
                    ax: -bx2,
                    ay: -by2,
                    bx: -(current.ax - ax2),
                    by: -(current.ay - ay2),
                });
                self.stack.push(HilbertFrame {
                    x: current.x + bx2,
                    y: current.y + by2,
                    ax: current.ax,
                    ay: current.ay,
                    bx: current.bx - bx2,
                    by: current.by - by2,
                });
                self.stack.push(HilbertFrame {
                    x: current.x,
                    y: current.y,
                    ax: bx2,
                    ay: by2,
                    bx: ax2,
                    by: ay2,
                });
            }
        }
    }
}
