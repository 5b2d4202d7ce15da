/// Number of cells a tape gets unless configured otherwise.
pub const DEFAULT_TAPE_SIZE: usize = 30_000;

/// Fixed-length memory tape of wrapping byte cells.
///
/// The tape never grows; the executor faults instead of moving the data
/// pointer past either end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<u8>,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_SIZE)
    }
}

impl Tape {
    /// A zeroed tape of `len` cells. A zero length is bumped to one cell so
    /// the data pointer always has somewhere to point.
    pub fn new(len: usize) -> Self {
        Self { cells: vec![0; len.max(1)] }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.cells.get(index).copied()
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut u8 {
        &mut self.cells[index]
    }

    /// Slice of up to `width` cells, page-aligned so the window containing
    /// `index` starts on a multiple of `width`. Returns `(base, slice)`.
    pub fn window(&self, index: usize, width: usize) -> (usize, &[u8]) {
        let width = width.max(1);
        let index = index.min(self.cells.len() - 1);
        let base = index - index % width;
        let end = (base + width).min(self.cells.len());
        (base, &self.cells[base..end])
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }
}
