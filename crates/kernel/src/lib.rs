// arraybench kernel
// Given a 2D input array, sets each output element to the input element plus
// the sum of its two indices. Four layouts of the same loop are provided so
// the harness can compare them.

use thiserror::Error;

/// How the 2D array is stored and walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Layout {
    /// `Vec<Vec<f32>>` with `[iy][ix]` indexing
    Nested,
    /// `Vec<Vec<f32>>` walked with zipped iterators
    Iterators,
    /// `Vec<Vec<f32>>` with bounds checks removed
    Unchecked,
    /// One row-major `Vec<f32>` with computed offsets
    Flat,
}

#[derive(Error, Debug, PartialEq)]
pub enum KernelError {
    #[error("Array shapes differ: input {input_nx}x{input_ny}, output {output_nx}x{output_ny}")]
    ShapeMismatch {
        input_nx: usize,
        input_ny: usize,
        output_nx: usize,
        output_ny: usize,
    },

    #[error("Error {0}")]
    Mismatch(Mismatch),
}

/// First element that does not hold `input + ix + iy`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub ix: usize,
    pub iy: usize,
    pub output: f32,
    pub input: f32,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} {}", self.ix, self.iy, self.output, self.input)
    }
}

/// Read access shared by both storage layouts
pub trait Plane {
    fn nx(&self) -> usize;
    fn ny(&self) -> usize;
    fn at(&self, ix: usize, iy: usize) -> f32;
}

fn input_value(nx: usize, ny: usize, ix: usize, iy: usize) -> f32 {
    (nx - ix + ny - iy) as f32
}

fn check_shape(input: &impl Plane, output: &impl Plane) -> Result<(), KernelError> {
    if input.nx() == output.nx() && input.ny() == output.ny() {
        Ok(())
    } else {
        Err(KernelError::ShapeMismatch {
            input_nx: input.nx(),
            input_ny: input.ny(),
            output_nx: output.nx(),
            output_ny: output.ny(),
        })
    }
}

/// Vector of rows; every row has exactly `nx` elements
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    nx: usize,
    ny: usize,
    rows: Vec<Vec<f32>>,
}

impl Grid {
    pub fn zeros(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            rows: vec![vec![0.0; nx]; ny],
        }
    }

    /// Input array: element (ix, iy) holds `nx - ix + ny - iy`
    pub fn input(nx: usize, ny: usize) -> Self {
        let rows = (0..ny)
            .map(|iy| (0..nx).map(|ix| input_value(nx, ny, ix, iy)).collect())
            .collect();
        Self { nx, ny, rows }
    }
}

impl Plane for Grid {
    fn nx(&self) -> usize {
        self.nx
    }

    fn ny(&self) -> usize {
        self.ny
    }

    fn at(&self, ix: usize, iy: usize) -> f32 {
        self.rows[iy][ix]
    }
}

/// Row-major storage: element (ix, iy) lives at `iy * nx + ix`
#[derive(Debug, Clone, PartialEq)]
pub struct FlatGrid {
    nx: usize,
    ny: usize,
    cells: Vec<f32>,
}

impl FlatGrid {
    pub fn zeros(nx: usize, ny: usize) -> Self {
        Self {
            nx,
            ny,
            cells: vec![0.0; nx * ny],
        }
    }

    pub fn input(nx: usize, ny: usize) -> Self {
        let cells = (0..ny)
            .flat_map(|iy| (0..nx).map(move |ix| input_value(nx, ny, ix, iy)))
            .collect();
        Self { nx, ny, cells }
    }
}

impl Plane for FlatGrid {
    fn nx(&self) -> usize {
        self.nx
    }

    fn ny(&self) -> usize {
        self.ny
    }

    fn at(&self, ix: usize, iy: usize) -> f32 {
        self.cells[iy * self.nx + ix]
    }
}

/// Straightforward indexing, rows outermost so each row is walked contiguously
pub fn add_indices_nested(input: &Grid, output: &mut Grid) -> Result<(), KernelError> {
    check_shape(input, output)?;
    for iy in 0..input.ny {
        for ix in 0..input.nx {
            output.rows[iy][ix] = input.rows[iy][ix] + (ix + iy) as f32;
        }
    }
    Ok(())
}

pub fn add_indices_iterators(input: &Grid, output: &mut Grid) -> Result<(), KernelError> {
    check_shape(input, output)?;
    for (iy, (in_row, out_row)) in input.rows.iter().zip(output.rows.iter_mut()).enumerate() {
        for (ix, (value, out)) in in_row.iter().zip(out_row.iter_mut()).enumerate() {
            *out = value + (ix + iy) as f32;
        }
    }
    Ok(())
}

pub fn add_indices_unchecked(input: &Grid, output: &mut Grid) -> Result<(), KernelError> {
    check_shape(input, output)?;
    for iy in 0..input.ny {
        for ix in 0..input.nx {
            // SAFETY: both grids have `ny` rows of `nx` elements (shape checked
            // above, row length fixed at construction), so iy < ny and ix < nx
            // are in bounds.
            unsafe {
                *output.rows.get_unchecked_mut(iy).get_unchecked_mut(ix) =
                    input.rows.get_unchecked(iy).get_unchecked(ix) + (ix + iy) as f32;
            }
        }
    }
    Ok(())
}

pub fn add_indices_flat(input: &FlatGrid, output: &mut FlatGrid) -> Result<(), KernelError> {
    check_shape(input, output)?;
    let nx = input.nx;
    for iy in 0..input.ny {
        for ix in 0..nx {
            output.cells[iy * nx + ix] = input.cells[iy * nx + ix] + (ix + iy) as f32;
        }
    }
    Ok(())
}

/// First element of `output` that is not `input + ix + iy`, scanning rows
pub fn verify(input: &impl Plane, output: &impl Plane) -> Option<Mismatch> {
    for iy in 0..input.ny() {
        for ix in 0..input.nx() {
            let expected = input.at(ix, iy) + (ix + iy) as f32;
            if output.at(ix, iy) != expected {
                return Some(Mismatch {
                    ix,
                    iy,
                    output: output.at(ix, iy),
                    input: input.at(ix, iy),
                });
            }
        }
    }
    None
}

/// Apply the kernel `nrpt` times to an `nx` x `ny` array, then check the result
pub fn run(layout: Layout, nrpt: u64, nx: usize, ny: usize) -> Result<(), KernelError> {
    let mismatch = match layout {
        Layout::Flat => {
            let input = FlatGrid::input(nx, ny);
            let mut output = FlatGrid::zeros(nx, ny);
            for _ in 0..nrpt {
                add_indices_flat(&input, &mut output)?;
            }
            verify(&input, &output)
        }
        Layout::Nested | Layout::Iterators | Layout::Unchecked => {
            let kernel = match layout {
                Layout::Iterators => add_indices_iterators,
                Layout::Unchecked => add_indices_unchecked,
                Layout::Nested | Layout::Flat => add_indices_nested,
            };
            let input = Grid::input(nx, ny);
            let mut output = Grid::zeros(nx, ny);
            for _ in 0..nrpt {
                kernel(&input, &mut output)?;
            }
            verify(&input, &output)
        }
    };

    match mismatch {
        Some(m) => Err(KernelError::Mismatch(m)),
        None => Ok(()),
    }
}
