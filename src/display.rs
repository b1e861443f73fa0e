use crate::error::Result;
use crate::grid::{CellState, Grid};
use crate::model::step;
use crate::random::RandomStream;
use automata_common::{ModelVariant, Params};
use std::fmt::Write as _;
use std::io::Write;
use std::time::Duration;

/// Console glyph for a cell state.
pub fn glyph(state: CellState) -> &'static str {
    match state {
        CellState::Normal => " ",
        CellState::Cancer => "●",
        CellState::Effector => "○",
        CellState::Dead => "▴",
        CellState::PendingCancer => "*",
    }
}

/// Renders the grid as text framed by a top and bottom border.
pub fn render(grid: &Grid) -> String {
    let size = grid.size();
    let mut out = String::with_capacity((size * 2 + 4) * (size + 2) * 3);

    out.push(' ');
    out.push_str(&"__".repeat(size));
    out.push_str(" \n");
    for row in 0..size {
        out.push('|');
        for col in 0..size {
            let _ = write!(out, "{} ", glyph(grid.get(row, col)));
        }
        out.push_str("|\n");
    }
    out.push(' ');
    out.push_str(&"‾‾".repeat(size));
    out.push_str(" \n");
    out
}

/// Animates `steps` steps on `out`, pausing `delay` between frames.
/// Prints the initial frame, one frame per step, and the final state.
pub fn iterate_display<R, W>(
    grid: &mut Grid,
    steps: u32,
    model: ModelVariant,
    params: &Params,
    rng: &mut R,
    delay: Duration,
    out: &mut W,
) -> Result<()>
where
    R: RandomStream + ?Sized,
    W: Write + ?Sized,
{
    for _ in 0..steps {
        write!(out, "\n\n\n{}", render(grid))?;
        out.flush()?;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        step(grid, model, params, rng)?;
    }
    write!(out, "\n\n\n{}", render(grid))?;
    out.flush()?;
    Ok(())
}
