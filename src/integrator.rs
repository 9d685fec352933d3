use crate::grid_state::GridState;

/// Rates and step size for one integration step. Copied out of the controller's
/// parameters once per step so a concurrent setter can never tear a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRates {
    pub beta: f32,
    pub gamma: f32,
    pub dt: f32,
}

/// Advances every cell by one forward-Euler step of the spatially coupled SIR system:
///
/// ```text
/// dS = -beta * S * I_neigh
/// dI =  beta * S * I_neigh - gamma * I
/// dR =  gamma * I
/// ```
///
/// `pressure` holds I_neigh per cell. Results are written in place and may leave
/// [0, 1]; the normalizer restores validity afterwards.
pub fn euler_step(grid: &mut GridState, pressure: &[f32], rates: StepRates) {
    let StepRates { beta, gamma, dt } = rates;
    let (susceptible, infected, recovered) = grid.channels_mut();
    debug_assert_eq!(pressure.len(), susceptible.len());

    for (((s, i), r), &i_neigh) in susceptible
        .iter_mut()
        .zip(infected.iter_mut())
        .zip(recovered.iter_mut())
        .zip(pressure.iter())
    {
        let new_infections = beta * *s * i_neigh;
        let recoveries = gamma * *i;

        let ds = -new_infections;
        let di = new_infections - recoveries;
        let dr = recoveries;

        *s += dt * ds;
        *i += dt * di;
        *r += dt * dr;
    }
}
