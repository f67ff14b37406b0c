//! # Uniform cell grid
//!
//! The square domain `[0, size] x [0, size]` is split into `bin_num x bin_num`
//! cells of side `cell_size` (the interaction cutoff), with
//! `bin_num = ceil(size / cell_size)`. Because a cell is as wide as the cutoff,
//! any two particles that can interact live in the same cell or in
//! Moore-adjacent cells, so the force pass only visits a 3x3 block.
//!
//! Cells store particle indices into the particle arena, never the particles
//! themselves. The grid also remembers each particle's home cell.
//!
//! ## Edge policy
//!
//! Cell `(row, col)` covers `[col*h, (col+1)*h) x [row*h, (row+1)*h)`. A
//! coordinate equal to `size` (the closed top/right wall) belongs to the last
//! row/column, which also absorbs any index that rounds up to `bin_num`.
//! Anything outside `[0, size]`, or non-finite, has no cell.
//!
//! ## Re-binning
//!
//! [`Grid::rebin`] never lets two workers write the same cell:
//! 1. every particle's target cell is computed in parallel into a private
//!    per-particle slot (read-only over the grid);
//! 2. particles that change cell are grouped by destination, in source-cell
//!    order, and then each cell is rewritten by exactly one worker: it keeps
//!    the members that stay and appends the ones arriving.
//!
//! The result does not depend on the number of worker threads.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::simulation::states::{NVec2, Particle};

/// Row/column address of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellIndex {
    pub row: usize,
    pub col: usize,
}

/// Per-step occupancy digest for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    pub occupied: usize, // cells with at least one member
    pub max: usize, // largest cell population
    pub total: usize, // members over all cells
}

#[derive(Debug, Clone)]
pub struct Grid {
    bin_num: usize,
    cell_size: f64,
    size: f64,
    cells: Vec<Vec<usize>>, // row-major, bin_num * bin_num
    home: Vec<usize>, // flat cell index of every particle
    incoming: Vec<Vec<usize>>, // scratch for re-binning, one list per destination
}

impl Grid {
    /// Build the grid and bin every particle.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `size` or `cell_size` is non-finite or `<= 0`
    /// - `Error::OutOfDomain` if a particle is outside `[0, size]`
    pub fn new(particles: &[Particle], size: f64, cell_size: f64) -> Result<Self> {
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "domain size must be finite and > 0, got {size}"
            )));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "cutoff must be finite and > 0, got {cell_size}"
            )));
        }
        if size < cell_size {
            warn!("domain size {size} is smaller than one cell ({cell_size}), grid has a single cell");
        }

        let bin_num = ((size / cell_size).ceil() as usize).max(1);
        let n_cells = bin_num.checked_mul(bin_num).ok_or_else(|| {
            Error::InvalidParam(format!("{bin_num} bins per axis overflows the cell count"))
        })?;

        let mut grid = Self {
            bin_num,
            cell_size,
            size,
            cells: empty_cells(n_cells)?,
            home: Vec::with_capacity(particles.len()),
            incoming: empty_cells(n_cells)?,
        };

        for (i, p) in particles.iter().enumerate() {
            let c = grid.target_cell(i, &p.x)?;
            grid.cells[c].push(i);
            grid.home.push(c);
        }

        info!(
            "grid: {} x {} cells of side {} over size {}, {} particles",
            bin_num,
            bin_num,
            cell_size,
            size,
            particles.len()
        );
        Ok(grid)
    }

    pub fn bin_num(&self) -> usize {
        self.bin_num
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of particles tracked by the grid
    pub fn len(&self) -> usize {
        self.home.len()
    }

    pub fn is_empty(&self) -> bool {
        self.home.is_empty()
    }

    pub fn flat(&self, idx: CellIndex) -> usize {
        debug_assert!(idx.row < self.bin_num && idx.col < self.bin_num);
        idx.row * self.bin_num + idx.col
    }

    pub fn unflat(&self, c: usize) -> CellIndex {
        CellIndex {
            row: c / self.bin_num,
            col: c % self.bin_num,
        }
    }

    /// Cell containing `pos`, `None` outside `[0, size]`
    pub fn cell_of(&self, pos: &NVec2) -> Option<CellIndex> {
        Some(CellIndex {
            row: self.axis_index(pos.y)?,
            col: self.axis_index(pos.x)?,
        })
    }

    fn axis_index(&self, coord: f64) -> Option<usize> {
        if !coord.is_finite() || coord < 0.0 || coord > self.size {
            return None;
        }
        // coord >= 0, so the cast floors; the closed upper wall folds into the last bin
        Some(((coord / self.cell_size) as usize).min(self.bin_num - 1))
    }

    /// Cell containing `pos`, under the edge policy above.
    ///
    /// Errors:
    /// - `Error::OutOfDomain` if `pos` is outside `[0, size]` or non-finite
    pub fn locate(&self, pos: &NVec2) -> Result<CellIndex> {
        self.cell_of(pos).ok_or_else(|| self.out_of_domain(None, pos))
    }

    fn target_cell(&self, index: usize, pos: &NVec2) -> Result<usize> {
        self.cell_of(pos)
            .map(|idx| self.flat(idx))
            .ok_or_else(|| self.out_of_domain(Some(index), pos))
    }

    fn out_of_domain(&self, index: Option<usize>, pos: &NVec2) -> Error {
        Error::OutOfDomain {
            index,
            x: pos.x,
            y: pos.y,
            size: self.size,
        }
    }

    /// Members of flat cell `c`
    pub fn members(&self, c: usize) -> &[usize] {
        &self.cells[c]
    }

    pub fn cell(&self, idx: CellIndex) -> &[usize] {
        self.members(self.flat(idx))
    }

    /// Home cell of particle `i`
    pub fn home(&self, i: usize) -> CellIndex {
        self.unflat(self.home[i])
    }

    /// Flat indices of the up-to-9 cells in the Moore neighbourhood of `c`,
    /// row by row, the cell itself included
    pub fn neighborhood(&self, c: usize) -> impl Iterator<Item = usize> + '_ {
        let CellIndex { row, col } = self.unflat(c);
        let last = self.bin_num - 1;
        let (min_r, max_r) = (row.saturating_sub(1), (row + 1).min(last));
        let (min_c, max_c) = (col.saturating_sub(1), (col + 1).min(last));
        (min_r..=max_r).flat_map(move |r| (min_c..=max_c).map(move |cc| r * self.bin_num + cc))
    }

    /// Cells visited by the force pass for a member of `c`: `c` itself first,
    /// then the other Moore neighbours row by row. Accelerations are summed
    /// in this order.
    pub fn interaction_cells(&self, c: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(c).chain(self.neighborhood(c).filter(move |&n| n != c))
    }

    /// Particle count per cell, row-major. Diagnostic only.
    pub fn occupancy(&self) -> Vec<usize> {
        self.cells.iter().map(Vec::len).collect()
    }

    pub fn total_members(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
    }

    pub fn occupancy_summary(&self) -> Occupancy {
        let mut summary = Occupancy {
            occupied: 0,
            max: 0,
            total: 0,
        };
        for cell in &self.cells {
            if !cell.is_empty() {
                summary.occupied += 1;
            }
            summary.max = summary.max.max(cell.len());
            summary.total += cell.len();
        }
        summary
    }

    /// Move every particle whose position left its cell into its new cell.
    /// Returns how many particles changed cell.
    pub fn rebin(&mut self, particles: &[Particle]) -> Result<usize> {
        if particles.len() != self.home.len() {
            return Err(Error::Membership(format!(
                "grid tracks {} particles, got {}",
                self.home.len(),
                particles.len()
            )));
        }

        // Pass 1: private target per particle
        let targets: Vec<usize> = particles
            .par_iter()
            .enumerate()
            .map(|(i, p)| self.target_cell(i, &p.x))
            .collect::<Result<_>>()?;

        let Grid {
            cells,
            home,
            incoming,
            ..
        } = self;

        // Group leavers by destination, visiting sources in cell order
        let mut moved = 0;
        for (c, members) in cells.iter().enumerate() {
            for &i in members {
                let target = targets[i];
                if target != c {
                    incoming[target].push(i);
                    moved += 1;
                }
            }
        }

        // Pass 2: one writer per cell
        cells
            .par_iter_mut()
            .zip(incoming.par_iter_mut())
            .enumerate()
            .for_each(|(c, (members, arriving))| {
                members.retain(|&i| targets[i] == c);
                members.append(arriving);
            });

        *home = targets;
        debug!("rebin: {moved} particles changed cell");
        Ok(moved)
    }

    /// Check that membership matches `particles`: every particle sits in
    /// exactly one cell, that cell is its recorded home, and the home is the
    /// cell its current position maps to.
    pub fn verify(&self, particles: &[Particle]) -> Result<()> {
        if particles.len() != self.home.len() {
            return Err(Error::Membership(format!(
                "grid tracks {} particles, got {}",
                self.home.len(),
                particles.len()
            )));
        }

        let mut seen = vec![0usize; particles.len()];
        for (c, members) in self.cells.iter().enumerate() {
            for &i in members {
                let Some(count) = seen.get_mut(i) else {
                    return Err(Error::Membership(format!(
                        "cell {:?} lists unknown particle {i}",
                        self.unflat(c)
                    )));
                };
                *count += 1;
                if self.home[i] != c {
                    return Err(Error::Membership(format!(
                        "particle {i} listed in {:?} but recorded in {:?}",
                        self.unflat(c),
                        self.home(i)
                    )));
                }
            }
        }
        if let Some((i, count)) = seen.iter().enumerate().find(|(_, count)| **count != 1) {
            return Err(Error::Membership(format!(
                "particle {i} is a member of {count} cells"
            )));
        }

        for (i, p) in particles.iter().enumerate() {
            let expected = self.target_cell(i, &p.x)?;
            if expected != self.home[i] {
                return Err(Error::Membership(format!(
                    "particle {i} at ({}, {}) belongs in {:?}, found in {:?}",
                    p.x.x,
                    p.x.y,
                    self.unflat(expected),
                    self.home(i)
                )));
            }
        }
        Ok(())
    }
}

fn empty_cells(n_cells: usize) -> Result<Vec<Vec<usize>>> {
    let mut cells = Vec::new();
    cells.try_reserve_exact(n_cells).map_err(|e| {
        Error::InvalidParam(format!("cannot allocate {n_cells} grid cells: {e}"))
    })?;
    cells.resize_with(n_cells, Vec::new);
    Ok(cells)
}
