/// Number of cells in a Moore neighbourhood.
pub const MOORE_NEIGHBOR_COUNT: usize = 8;

// Calculates the 1D index of the cell at (row + dy, col + dx), wrapping both axes.
#[inline(always)]
pub fn wrapped_cell_idx(row: usize, col: usize, dy: isize, dx: isize, height: usize, width: usize) -> usize {
    let wrapped_row = (row as isize + dy).rem_euclid(height as isize) as usize;
    let wrapped_col = (col as isize + dx).rem_euclid(width as isize) as usize;
    wrapped_row * width + wrapped_col
}

/// Helper to iterate over the 8 Moore neighbours of (row, col) on a torus.
/// Calls `f` with each neighbour's 1D index. On lattices narrower than 3 along an
/// axis the same index can be visited more than once, including the centre itself.
#[inline(always)]
pub fn for_each_moore_neighbor<F>(row: usize, col: usize, height: usize, width: usize, mut f: F)
where
    F: FnMut(usize),
{
    for dy in -1..=1isize {
        for dx in -1..=1isize {
            if dy == 0 && dx == 0 { continue; } // Skip the centre cell
            f(wrapped_cell_idx(row, col, dy, dx, height, width));
        }
    }
}

/// Computes the local infection pressure: for every cell, the mean infected fraction
/// of its 8 Moore neighbours with periodic boundaries.
///
/// `infected` and `pressure_out` are row-major `height * width` slices. The input is
/// only read; every element of `pressure_out` is overwritten.
pub fn compute_infection_pressure(infected: &[f32], height: usize, width: usize, pressure_out: &mut [f32]) {
    debug_assert_eq!(infected.len(), height * width);
    debug_assert_eq!(pressure_out.len(), height * width);

    let inv_count = 1.0 / MOORE_NEIGHBOR_COUNT as f32;
    for row in 0..height {
        for col in 0..width {
            let mut sum = 0.0f32;
            for_each_moore_neighbor(row, col, height, width, |neighbor_idx| {
                sum += infected[neighbor_idx];
            });
            pressure_out[row * width + col] = sum * inv_count;
        }
    }
}
