use crate::grid_state::GridState;

/// Fractions a cell is reset to when clipping leaves it with S = I = R = 0.
pub const DEGENERATE_CELL_BASELINE: (f32, f32, f32) = (0.0, 0.0, 1.0);

#[inline(always)]
fn clip_fraction(v: f32) -> f32 {
    // NaN compares false everywhere, so map it explicitly.
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Clips every fraction to [0, 1] and rescales each cell so S + I + R = 1.
///
/// A cell whose clipped total is exactly zero carries no population to rescale and
/// is set to [`DEGENERATE_CELL_BASELINE`]. Returns how many cells needed that reset.
pub fn normalize(grid: &mut GridState) -> usize {
    let (susceptible, infected, recovered) = grid.channels_mut();
    let mut degenerate_cells = 0;

    for ((s, i), r) in susceptible
        .iter_mut()
        .zip(infected.iter_mut())
        .zip(recovered.iter_mut())
    {
        *s = clip_fraction(*s);
        *i = clip_fraction(*i);
        *r = clip_fraction(*r);

        let total = *s + *i + *r;
        if total == 0.0 {
            (*s, *i, *r) = DEGENERATE_CELL_BASELINE;
            degenerate_cells += 1;
            continue;
        }

        let inv_total = 1.0 / total;
        *s *= inv_total;
        *i *= inv_total;
        *r *= inv_total;
    }

    degenerate_cells
}
