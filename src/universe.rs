use crate::cells::Cells;
use crate::dense_set::DenseSet;
use crate::node::{Macrocell, NodeIdx};
use ahash::AHashMap as HashMap;
use anyhow::{anyhow, Result};
use num_bigint::BigInt;
use tracing::{debug, warn};

/// A Hashlife universe: one hash-consing set per tier.
///
/// Tier 0 holds 8x8 [`Cells`] blocks keyed by bitmap; tier `n >= 1` holds
/// [`Macrocell`]s whose children are indices into tier `n - 1`, so a tier-n
/// node covers a square of side `8 * 2^n`. Interning gives every distinct
/// sub-universe a single index, which makes the future memos on macrocells
/// a global cache: each distinct future is computed once per reset epoch.
///
/// All capacities are fixed up front. When a tier saturates, the only
/// remedy is [`clear`](Universe::clear) and a retry with a larger capacity;
/// nodes are never reclaimed individually.
pub struct Universe {
    /// Tier 0.
    blocks: DenseSet<Cells>,
    /// `tiers[n - 1]` is tier `n`.
    tiers: Vec<DenseSet<Macrocell>>,
}

impl Universe {
    /// A universe with `levels` macrocell tiers above the base tier, every
    /// tier sized to `tier_capacity` slots.
    pub fn new(levels: usize, tier_capacity: usize) -> Self {
        assert!(levels >= 1, "universe: at least one macrocell tier is required");
        debug!(levels, tier_capacity, "allocating universe tiers");
        Self {
            blocks: DenseSet::new(tier_capacity),
            tiers: (0..levels).map(|_| DenseSet::new(tier_capacity)).collect(),
        }
    }

    /// The number of macrocell tiers.
    pub fn levels(&self) -> usize {
        self.tiers.len()
    }

    /// The number of interned nodes in a tier.
    pub fn tier_len(&self, level: usize) -> usize {
        if level == 0 {
            self.blocks.len()
        } else {
            self.tier(level).len()
        }
    }

    fn tier(&self, level: usize) -> &DenseSet<Macrocell> {
        assert!(
            (1..=self.tiers.len()).contains(&level),
            "universe: tier {} does not exist",
            level
        );
        &self.tiers[level - 1]
    }

    /// Interns a base cell block and returns its tier-0 index.
    pub fn intern_cells(&mut self, block: Cells) -> Result<NodeIdx> {
        self.blocks
            .emplace(block)
            .index()
            .ok_or_else(|| Self::saturated(0))
    }

    /// Interns a macrocell at tier `level` from four tier `level - 1`
    /// children and returns its index. Equal child tuples always map to
    /// the same index.
    pub fn intern(
        &mut self,
        level: usize,
        nw: NodeIdx,
        ne: NodeIdx,
        sw: NodeIdx,
        se: NodeIdx,
    ) -> Result<NodeIdx> {
        self.tier(level);
        self.tiers[level - 1]
            .emplace(Macrocell::new(nw, ne, sw, se))
            .index()
            .ok_or_else(|| Self::saturated(level))
    }

    fn saturated(level: usize) -> anyhow::Error {
        warn!(level, "tier saturated");
        anyhow!(
            "tier {} is saturated, reset and retry with a larger capacity",
            level
        )
    }

    /// Resolves a tier-0 index.
    pub fn cells(&self, idx: NodeIdx) -> &Cells {
        &self.blocks[idx]
    }

    /// Resolves a macrocell index at tier `level`.
    pub fn macrocell(&self, level: usize, idx: NodeIdx) -> &Macrocell {
        &self.tier(level)[idx]
    }

    /// The one-generation successor of the central region of a tier
    /// `level` macrocell, as a tier `level - 1` index. Memo hits return
    /// without any lookups.
    pub fn step(&mut self, level: usize, idx: NodeIdx) -> Result<NodeIdx> {
        let cell = *self.macrocell(level, idx);
        if !cell.step.is_null() {
            return Ok(cell.step);
        }

        let result = if level == 1 {
            let [nw, ne, sw, se] = cell.children().map(|c| self.blocks[c]);
            self.intern_cells(Cells::center(nw, ne, sw, se).step())?
        } else {
            let centers = self.nine_disjoint(level, &cell)?;
            let quadrants = self.four_overlapping(level - 1, &centers)?;
            let mut advanced = [NodeIdx::NULL; 4];
            for (dst, quadrant) in advanced.iter_mut().zip(quadrants) {
                *dst = self.step(level - 1, quadrant)?;
            }
            self.intern(level - 1, advanced[0], advanced[1], advanced[2], advanced[3])?
        };

        self.tiers[level - 1][idx].step = result;
        Ok(result)
    }

    /// The jump-step successor of the central region of a tier `level`
    /// macrocell, as a tier `level - 1` index. The jump distance doubles
    /// per tier from the two-generation base case.
    ///
    /// At tier 1 the children are base blocks and the cell kernel is
    /// called directly. Above that, the nine overlapping sub-regions are
    /// interned, recursed to their own jump futures, regrouped into the
    /// four quadrants of the future and recursed once more.
    pub fn next(&mut self, level: usize, idx: NodeIdx) -> Result<NodeIdx> {
        let cell = *self.macrocell(level, idx);
        if !cell.next.is_null() {
            return Ok(cell.next);
        }

        let result = if level == 1 {
            let [nw, ne, sw, se] = cell.children().map(|c| self.blocks[c]);
            self.intern_cells(Cells::center(nw, ne, sw, se).next())?
        } else {
            let regions = self.nine_overlapping(level, &cell)?;
            let mut futures = [NodeIdx::NULL; 9];
            for (dst, region) in futures.iter_mut().zip(regions) {
                *dst = self.next(level - 1, region)?;
            }
            let quadrants = self.four_overlapping(level - 1, &futures)?;
            let mut advanced = [NodeIdx::NULL; 4];
            for (dst, quadrant) in advanced.iter_mut().zip(quadrants) {
                *dst = self.next(level - 1, quadrant)?;
            }
            self.intern(level - 1, advanced[0], advanced[1], advanced[2], advanced[3])?
        };

        self.tiers[level - 1][idx].next = result;
        Ok(result)
    }

    /// The four children of `cell` plus its five half-overlap regions
    /// (N, W, center, E, S), row by row, each interned at tier
    /// `level - 1`. Requires `level >= 2`.
    fn nine_overlapping(&mut self, level: usize, cell: &Macrocell) -> Result<[NodeIdx; 9]> {
        let [nw, ne, sw, se] = cell.children().map(|c| self.tiers[level - 2][c]);
        let north = self.intern(level - 1, nw.ne, ne.nw, nw.se, ne.sw)?;
        let west = self.intern(level - 1, nw.sw, nw.se, sw.nw, sw.ne)?;
        let center = self.intern(level - 1, nw.se, ne.sw, sw.ne, se.nw)?;
        let east = self.intern(level - 1, ne.sw, ne.se, se.nw, se.ne)?;
        let south = self.intern(level - 1, sw.ne, se.nw, sw.se, se.sw)?;
        let children = cell.children();
        Ok([
            children[0],
            north,
            children[1],
            west,
            center,
            east,
            children[2],
            south,
            children[3],
        ])
    }

    /// Centers of the nine 2x2 groupings of grandchildren of `cell`:
    /// disjoint tier `level - 2` tiles covering its middle three quarters.
    /// Requires `level >= 2`.
    fn nine_disjoint(&mut self, level: usize, cell: &Macrocell) -> Result<[NodeIdx; 9]> {
        let [nw, ne, sw, se] = cell.children().map(|c| self.tiers[level - 2][c]);
        let groups: [[NodeIdx; 4]; 9] = [
            [nw.nw, nw.ne, nw.sw, nw.se],
            [nw.ne, ne.nw, nw.se, ne.sw],
            [ne.nw, ne.ne, ne.sw, ne.se],
            [nw.sw, nw.se, sw.nw, sw.ne],
            [nw.se, ne.sw, sw.ne, se.nw],
            [ne.sw, ne.se, se.nw, se.ne],
            [sw.nw, sw.ne, sw.sw, sw.se],
            [sw.ne, se.nw, sw.se, se.sw],
            [se.nw, se.ne, se.sw, se.se],
        ];

        let mut centers = [NodeIdx::NULL; 9];
        for (dst, [a, b, c, d]) in centers.iter_mut().zip(groups) {
            *dst = if level == 2 {
                let center =
                    Cells::center(self.blocks[a], self.blocks[b], self.blocks[c], self.blocks[d]);
                self.intern_cells(center)?
            } else {
                let [a, b, c, d] = [a, b, c, d].map(|x| self.tiers[level - 3][x]);
                self.intern(level - 2, a.se, b.sw, c.ne, d.nw)?
            };
        }
        Ok(centers)
    }

    /// Regroups nine row-major parts one tier down into the four
    /// overlapping 2x2 quadrant nodes, interned at tier `level`.
    fn four_overlapping(&mut self, level: usize, parts: &[NodeIdx; 9]) -> Result<[NodeIdx; 4]> {
        Ok([
            self.intern(level, parts[0], parts[1], parts[3], parts[4])?,
            self.intern(level, parts[1], parts[2], parts[4], parts[5])?,
            self.intern(level, parts[3], parts[4], parts[6], parts[7])?,
            self.intern(level, parts[4], parts[5], parts[7], parts[8])?,
        ])
    }

    /// The number of living cells under a node, memoized per tier.
    pub fn population(&self, level: usize, idx: NodeIdx) -> BigInt {
        fn inner(
            universe: &Universe,
            level: usize,
            idx: NodeIdx,
            caches: &mut [HashMap<NodeIdx, BigInt>],
        ) -> BigInt {
            if let Some(cached) = caches[level].get(&idx) {
                return cached.clone();
            }
            let result = if level == 0 {
                BigInt::from(universe.blocks[idx].population_count())
            } else {
                universe.tiers[level - 1][idx]
                    .children()
                    .into_iter()
                    .map(|child| inner(universe, level - 1, child, caches))
                    .sum()
            };
            caches[level].insert(idx, result.clone());
            result
        }

        if level > 0 {
            self.tier(level);
        }
        let mut caches = vec![HashMap::new(); level + 1];
        inner(self, level, idx, &mut caches)
    }

    /// The coordinated full reset: every tier is cleared in one sweep and
    /// all previously issued indices become invalid. Partial resets are
    /// not supported, so this is the only reclamation mechanism.
    pub fn clear(&mut self) {
        debug!("resetting universe tiers");
        self.blocks.clear();
        for tier in &mut self.tiers {
            tier.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    const SEED: u64 = 42;

    fn glider_corner(universe: &mut Universe) -> NodeIdx {
        let nw = universe.intern_cells(Cells::glider()).unwrap();
        let blank = universe.intern_cells(Cells::empty_square()).unwrap();
        universe.intern(1, nw, blank, blank, blank).unwrap()
    }

    #[test]
    fn test_interning_deduplicates() {
        let mut universe = Universe::new(1, 64);
        assert_eq!(universe.levels(), 1);
        let first = universe.intern_cells(Cells::glider()).unwrap();
        let second = universe.intern_cells(Cells::glider()).unwrap();
        assert_eq!(first, second);
        assert_eq!(universe.tier_len(0), 1);

        let a = universe.intern(1, first, first, first, first).unwrap();
        let b = universe.intern(1, first, first, first, first).unwrap();
        assert_eq!(a, b);
        assert_eq!(universe.tier_len(1), 1);
    }

    #[test]
    fn test_interned_children_resolve() {
        let mut universe = Universe::new(1, 64);
        let idx = universe.intern_cells(Cells::blinker()).unwrap();
        assert_eq!(*universe.cells(idx), Cells::blinker());

        let node = glider_corner(&mut universe);
        assert_eq!(*universe.cells(universe.macrocell(1, node).nw), Cells::glider());
    }

    #[test]
    fn test_tier_one_next_applies_the_cell_kernel() {
        let mut universe = Universe::new(1, 64);
        let block = universe.intern_cells(Cells::block()).unwrap();
        let node = universe.intern(1, block, block, block, block).unwrap();

        let future = universe.next(1, node).unwrap();
        let expected = Cells::center(
            Cells::block(),
            Cells::block(),
            Cells::block(),
            Cells::block(),
        )
        .next();
        assert_eq!(*universe.cells(future), expected);
    }

    #[test]
    fn test_next_is_memoized_and_deterministic() {
        let mut universe = Universe::new(1, 64);
        let node = glider_corner(&mut universe);

        assert!(universe.macrocell(1, node).next.is_null());
        let first = universe.next(1, node).unwrap();
        assert_eq!(universe.macrocell(1, node).next, first);
        let second = universe.next(1, node).unwrap();
        assert_eq!(first, second);

        // A separately built universe with the same insertion order lands
        // on the same indices.
        let mut other = Universe::new(1, 64);
        let other_node = glider_corner(&mut other);
        assert_eq!(other_node, node);
        assert_eq!(other.next(1, other_node).unwrap(), first);
    }

    #[test]
    fn test_memo_is_shared_between_equal_macrocells() {
        let mut universe = Universe::new(1, 64);
        let node = glider_corner(&mut universe);
        let future = universe.next(1, node).unwrap();

        // Re-interning the same children yields the same node, memo
        // already in place.
        let again = glider_corner(&mut universe);
        assert_eq!(again, node);
        assert_eq!(universe.macrocell(1, again).next, future);
    }

    #[test]
    fn test_tier_two_recursion() {
        let mut universe = Universe::new(2, 4096);
        let blank = universe.intern_cells(Cells::empty_square()).unwrap();
        let glider = universe.intern_cells(Cells::glider()).unwrap();
        let corner = universe.intern(1, glider, blank, blank, blank).unwrap();
        let empty = universe.intern(1, blank, blank, blank, blank).unwrap();
        let node = universe.intern(2, corner, empty, empty, empty).unwrap();

        let first = universe.next(2, node).unwrap();
        let second = universe.next(2, node).unwrap();
        assert_eq!(first, second);
        assert_eq!(universe.macrocell(2, node).next, first);

        let stepped = universe.step(2, node).unwrap();
        assert_eq!(universe.step(2, node).unwrap(), stepped);
        assert_eq!(universe.macrocell(2, node).step, stepped);
    }

    #[test]
    fn test_population_sums_tiers() {
        let mut universe = Universe::new(1, 64);
        let glider = universe.intern_cells(Cells::glider()).unwrap();
        let blinker = universe.intern_cells(Cells::blinker()).unwrap();
        let node = universe.intern(1, glider, glider, blinker, blinker).unwrap();

        assert_eq!(universe.population(0, glider), BigInt::from(5));
        assert_eq!(universe.population(1, node), BigInt::from(16));
    }

    #[test]
    fn test_saturation_surfaces_as_error() {
        let mut universe = Universe::new(1, 4);
        let mut failed = false;
        for i in 0..16 {
            if universe.intern_cells(Cells::random(Some(SEED + i))).is_err() {
                failed = true;
                break;
            }
        }
        assert!(failed, "a capacity-4 tier must saturate");
    }

    #[test]
    fn test_clear_invalidates_all_tiers() {
        let mut universe = Universe::new(1, 64);
        let node = glider_corner(&mut universe);
        universe.next(1, node).unwrap();
        assert!(universe.tier_len(0) > 0);

        universe.clear();
        assert_eq!(universe.tier_len(0), 0);
        assert_eq!(universe.tier_len(1), 0);

        // The epoch restarts cleanly: the same construction works again
        // and the memo is recomputed, not inherited.
        let node = glider_corner(&mut universe);
        assert!(universe.macrocell(1, node).next.is_null());
        universe.next(1, node).unwrap();
    }
}
