use crate::bitwise::{bit, full_add, half_add};
use crate::dense_set::SetKey;
use rand::{Rng, SeedableRng};

/// A block of 8x8 life cells packed into a single 64-bit word.
///
/// The bitmap is laid out row by row: the cell at `(x, y)` occupies bit
/// `x + 8 * y`, with the origin in the top-left corner, x growing east and
/// y growing south.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Cells(u64);

/// One step only determines the inner 6x6: the outer ring has incomplete
/// neighbourhoods and is forced dead.
const STEP_MASK: u64 = 0x007e7e7e7e7e7e00;
/// Two steps only determine the inner 4x4.
const NEXT_MASK: u64 = 0x00003c3c3c3c0000;
/// Per-row masks used by the single-column shifts.
const WEST_COLUMNS: u64 = 0x7f7f7f7f7f7f7f7f;
const EAST_COLUMNS: u64 = 0xfefefefefefefefe;

impl Cells {
    pub const COLUMNS: usize = 8;
    pub const ROWS: usize = 8;

    pub fn new(bitmap: u64) -> Self {
        Self(bitmap)
    }

    /// Parses Tomas Rokicki's cell format: `'*'` is a living cell, `'.'` a
    /// dead one, and `'$'` (or a newline, so printed blocks read back)
    /// starts the next row with unmentioned cells dead.
    ///
    /// Parsing is total: unknown characters are skipped and content past
    /// the 8x8 block is dropped.
    pub fn from_glyphs(format: &str) -> Self {
        let mut bitmap = 0u64;
        let (mut row, mut column) = (0usize, 0usize);
        for character in format.chars() {
            match character {
                '*' => {
                    if row < Self::ROWS && column < Self::COLUMNS {
                        bitmap |= 1 << (column + row * Self::COLUMNS);
                    }
                    column += 1;
                }
                '.' => column += 1,
                '$' | '\n' => {
                    column = 0;
                    row += 1;
                }
                _ => {}
            }
        }
        Self(bitmap)
    }

    pub fn bitmap(&self) -> u64 {
        self.0
    }

    /// Whether the cell at `(x, y)` is alive. Coordinates outside the
    /// block read as dead.
    pub fn get(&self, x: usize, y: usize) -> bool {
        let index = u32::try_from(x + y * Self::COLUMNS).unwrap_or(u32::MAX);
        bit(self.0, index)
    }

    /// Advances the block one generation under B3/S23.
    ///
    /// A cell lives iff it is alive with 3 neighbours, or exactly three
    /// cells of its closed neighbourhood are alive. Implemented with
    /// full-adder bitplanes, see Tony Finch's "Life in a Register".
    pub fn step(&self) -> Self {
        let [sum1, sum2, sum4] = self.neighbours();
        let case1 = self.0 & (!sum1 & !sum2 & sum4);
        let case2 = sum1 & sum2 & !sum4;
        Self((case1 | case2) & STEP_MASK)
    }

    /// Advances the block two generations, keeping the inner 4x4 that is
    /// fully determined by the block alone. This is the base case the
    /// macrocell recursion consumes.
    pub fn next(&self) -> Self {
        Self(self.step().step().0 & NEXT_MASK)
    }

    /// Neighbour count per cell as three bitplanes (bits 1, 2 and 4).
    ///
    /// Counts of 8 and 9 overflow to 0 and 1; both mean death, so the
    /// overflow is harmless.
    fn neighbours(&self) -> [u64; 3] {
        let left = self.0 << 1;
        let right = self.0 >> 1;
        let (mid1, mid2) = full_add(left, self.0, right);

        let up1 = mid1 << Self::COLUMNS;
        let up2 = mid2 << Self::COLUMNS;
        let down1 = mid1 >> Self::COLUMNS;
        let down2 = mid2 >> Self::COLUMNS;

        let (sum1, sum2a) = full_add(up1, mid1, down1);
        let (sum2b, sum4a) = full_add(up2, mid2, down2);
        let (sum2, sum4b) = half_add(sum2a, sum2b);
        let sum4 = sum4a ^ sum4b;

        [sum1, sum2, sum4]
    }

    pub fn population_count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Shifts every cell one row north; the vacated south row is dead.
    pub fn north(&self) -> Self {
        Self(self.0 >> Self::COLUMNS)
    }

    /// Shifts every cell one row south; the vacated north row is dead.
    pub fn south(&self) -> Self {
        Self(self.0 << Self::COLUMNS)
    }

    /// Shifts every cell one column west; the vacated east column is dead.
    pub fn west(&self) -> Self {
        Self((self.0 >> 1) & WEST_COLUMNS)
    }

    /// Shifts every cell one column east; the vacated west column is dead.
    pub fn east(&self) -> Self {
        Self((self.0 << 1) & EAST_COLUMNS)
    }

    /// Stitches the east half of `west` to the west half of `east`.
    pub fn horizontal(west: Self, east: Self) -> Self {
        Self(((west.0 >> 4) & 0x0f0f0f0f0f0f0f0f) | ((east.0 << 4) & 0xf0f0f0f0f0f0f0f0))
    }

    /// Stitches the south half of `north` to the north half of `south`.
    pub fn vertical(north: Self, south: Self) -> Self {
        Self((north.0 >> 32) | (south.0 << 32))
    }

    /// The central 8x8 of the 16x16 square formed by four blocks: each
    /// quadrant is the inner corner quarter of the matching input.
    pub fn center(nw: Self, ne: Self, sw: Self, se: Self) -> Self {
        Self::vertical(Self::horizontal(nw, ne), Self::horizontal(sw, se))
    }

    /// A block with a ChaCha8-generated bitmap; seeds from the OS when
    /// `seed` is `None`.
    pub fn random(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(x) => rand_chacha::ChaCha8Rng::seed_from_u64(x),
            None => rand_chacha::ChaCha8Rng::from_os_rng(),
        };
        Self(rng.random())
    }

    // The canonical still lifes, oscillators and spaceship.
    pub fn empty_square() -> Self {
        Self::from_glyphs("$$$$$$$$")
    }
    pub fn block() -> Self {
        Self::from_glyphs("$$$...**...$...**...$$$$")
    }
    pub fn beehive() -> Self {
        Self::from_glyphs("$$$...**$..*..*$...**$$$")
    }
    pub fn loaf() -> Self {
        Self::from_glyphs("$$...**$..*..*$...*.*$....*$$$")
    }
    pub fn boat() -> Self {
        Self::from_glyphs("$$$..**$..*.*$...*$$$")
    }
    pub fn tub() -> Self {
        Self::from_glyphs("$$$...*$..*.*$...*$$$")
    }
    pub fn blinker() -> Self {
        Self::from_glyphs("$$.***$$$$$$")
    }
    pub fn toad() -> Self {
        Self::from_glyphs("$$$...***$..***$$$$")
    }
    pub fn beacon() -> Self {
        Self::from_glyphs("$$..**$..**$....**$....**$$$")
    }
    pub fn glider() -> Self {
        Self::from_glyphs("$$...*$..*$..***$$$$")
    }
    pub fn filled() -> Self {
        Self(u64::MAX)
    }
}

impl From<u64> for Cells {
    fn from(bitmap: u64) -> Self {
        Self(bitmap)
    }
}

impl std::fmt::Display for Cells {
    /// Prints the block as 8 lines of 8 characters, living cells as `'*'`
    /// and dead ones as `'.'`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..Self::ROWS {
            for x in 0..Self::COLUMNS {
                f.write_str(if self.get(x, y) { "*" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl SetKey for Cells {
    fn hash(&self) -> u64 {
        self.0
    }
}
