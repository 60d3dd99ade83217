//! Reading and writing legacy ASCII VTK unstructured grid files.

use crate::{
    error::invalid_data,
    geometry::{Dim3::*, Point3, Vec3},
    interpolation::{CellShape, LinearInterpolator, Solution},
    mesh::Mesh,
    num::{from_f64, BFloat},
    sampling::{QuantityLabels, SampleSet},
};
use std::{
    collections::HashMap,
    io::{self, Write},
    iter::Peekable,
    str::{FromStr, SplitWhitespace},
};

/// VTK cell type of a single vertex.
const VTK_VERTEX: u8 = 1;

fn write_header<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "# {}", title)?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")
}

fn write_points<'a, F, W, I>(writer: &mut W, n_points: usize, points: I) -> io::Result<()>
where
    F: BFloat + 'a,
    W: Write,
    I: Iterator<Item = &'a Point3<F>>,
{
    writeln!(writer, "\nPOINTS {} double", n_points)?;
    for point in points {
        writeln!(writer, "{} {} {}", point[X], point[Y], point[Z])?;
    }
    Ok(())
}

fn write_scalars<W, T, I>(writer: &mut W, name: &str, data_type: &str, values: I) -> io::Result<()>
where
    W: Write,
    T: std::fmt::Display,
    I: Iterator<Item = T>,
{
    writeln!(writer, "\nSCALARS {} {}", name, data_type)?;
    writeln!(writer, "LOOKUP_TABLE default")?;
    for value in values {
        writeln!(writer, "{}", value)?;
    }
    Ok(())
}

fn write_vectors<'a, F, W, I>(writer: &mut W, name: &str, vectors: I) -> io::Result<()>
where
    F: BFloat + 'a,
    W: Write,
    I: Iterator<Item = &'a Vec3<F>>,
{
    writeln!(writer, "\nVECTORS {} double", name)?;
    for vector in vectors {
        writeln!(writer, "{} {} {}", vector[X], vector[Y], vector[Z])?;
    }
    Ok(())
}

/// Writes the sample positions as vertex cells, with the sample ID, location
/// marker, scalar, norm and vector as point data.
pub fn write_sample_set_vtk<F: BFloat, W: Write>(
    sample_set: &SampleSet<F>,
    writer: &mut W,
) -> io::Result<()> {
    let samples = sample_set.samples();
    let labels = sample_set.labels();
    let n_samples = samples.len();

    write_header(writer, "Interpolated solution")?;
    write_points(
        writer,
        n_samples,
        samples.iter().map(|sample| &sample.position),
    )?;

    writeln!(writer, "\nCELLS {} {}", n_samples, 2 * n_samples)?;
    for idx in 0..n_samples {
        writeln!(writer, "1 {}", idx)?;
    }
    writeln!(writer, "\nCELL_TYPES {}", n_samples)?;
    for _ in 0..n_samples {
        writeln!(writer, "{}", VTK_VERTEX)?;
    }

    writeln!(writer, "\nPOINT_DATA {}", n_samples)?;
    write_scalars(writer, "id", "int", samples.iter().map(|sample| sample.id))?;
    write_scalars(
        writer,
        "marker",
        "int",
        samples.iter().map(|sample| if sample.located { 0 } else { 1 }),
    )?;
    write_scalars(
        writer,
        labels.scalar,
        "double",
        samples.iter().map(|sample| sample.solution.scalar),
    )?;
    write_scalars(
        writer,
        labels.norm,
        "double",
        samples.iter().map(|sample| sample.solution.norm),
    )?;
    write_vectors(
        writer,
        labels.vector,
        samples.iter().map(|sample| &sample.solution.vector),
    )
}

/// Writes the mesh of the interpolator with the node solutions as point data.
pub fn write_interpolator_vtk<F, S, W, const N: usize>(
    interpolator: &LinearInterpolator<F, S, N>,
    labels: &QuantityLabels,
    writer: &mut W,
) -> io::Result<()>
where
    F: BFloat,
    S: CellShape<N>,
    W: Write,
{
    let mesh = interpolator.mesh();
    let solutions = interpolator.solutions();

    write_header(writer, "Interpolator mesh")?;
    write_points(writer, mesh.n_nodes(), mesh.nodes().iter())?;

    writeln!(
        writer,
        "\nCELLS {} {}",
        mesh.n_cells(),
        (N + 1) * mesh.n_cells()
    )?;
    for cell in mesh.cells() {
        write!(writer, "{}", N)?;
        for node in cell {
            write!(writer, " {}", node)?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "\nCELL_TYPES {}", mesh.n_cells())?;
    for _ in 0..mesh.n_cells() {
        writeln!(writer, "{}", S::VTK_CELL_TYPE)?;
    }

    writeln!(writer, "\nPOINT_DATA {}", mesh.n_nodes())?;
    write_scalars(
        writer,
        labels.scalar,
        "double",
        solutions.iter().map(|solution| solution.scalar),
    )?;
    write_scalars(
        writer,
        labels.norm,
        "double",
        solutions.iter().map(|solution| solution.norm),
    )?;
    write_vectors(
        writer,
        labels.vector,
        solutions.iter().map(|solution| &solution.vector),
    )
}

/// A mesh with a solution at each node.
#[derive(Clone, Debug)]
pub struct MeshWithSolution<F: BFloat, const N: usize> {
    pub mesh: Mesh<F, N>,
    pub solutions: Vec<Solution<F>>,
}

/// Parses an unstructured grid of `S` cells with node solutions.
///
/// The vector part of the solutions is taken from the `VECTORS` array named
/// `labels.vector`, or the first `VECTORS` array if there is none by that name.
/// The scalar part is taken from the `SCALARS` array named `labels.scalar`.
/// Missing parts are set to zero.
pub fn parse_mesh_vtk<F, S, const N: usize>(
    text: &str,
    labels: &QuantityLabels,
) -> io::Result<MeshWithSolution<F, N>>
where
    F: BFloat,
    S: CellShape<N>,
{
    let mut lines = text.lines();
    let version_line = lines.next().unwrap_or_default();
    if !version_line.starts_with("# vtk DataFile") {
        return Err(invalid_data("Missing VTK file header"));
    }
    // Skip the title line
    lines.next();
    let body = lines.collect::<Vec<_>>().join("\n");
    let mut reader = TokenReader::new(&body);

    reader.expect_keyword("ASCII")?;
    reader.expect_keyword("DATASET")?;
    reader.expect_keyword("UNSTRUCTURED_GRID")?;

    let mut nodes = Vec::new();
    let mut cells = Vec::new();
    let mut scalars: HashMap<String, Vec<F>> = HashMap::new();
    let mut vectors: Vec<(String, Vec<Vec3<F>>)> = Vec::new();

    while let Some(keyword) = reader.next_keyword() {
        match keyword {
            "POINTS" => {
                let n_points: usize = reader.parse_next("point count")?;
                reader.next_token("point data type")?;
                nodes = (0..n_points)
                    .map(|_| {
                        let [x, y, z] = reader.parse_float_triple()?;
                        Ok(Point3::new(x, y, z))
                    })
                    .collect::<io::Result<_>>()?;
            }
            "CELLS" => {
                let n_cells: usize = reader.parse_next("cell count")?;
                reader.parse_next::<usize>("cell list size")?;
                cells = (0..n_cells)
                    .map(|cell_idx| {
                        let n_cell_nodes: usize = reader.parse_next("cell node count")?;
                        if n_cell_nodes != N {
                            return Err(invalid_data(format!(
                                "Cell {} has {} nodes, expected {} for {} cells",
                                cell_idx,
                                n_cell_nodes,
                                N,
                                S::NAME
                            )));
                        }
                        let mut cell = [0; N];
                        for node in cell.iter_mut() {
                            *node = reader.parse_next("cell node index")?;
                        }
                        Ok(cell)
                    })
                    .collect::<io::Result<_>>()?;
            }
            "CELL_TYPES" => {
                let n_cells: usize = reader.parse_next("cell type count")?;
                for _ in 0..n_cells {
                    let cell_type: u8 = reader.parse_next("cell type")?;
                    if cell_type != S::VTK_CELL_TYPE {
                        return Err(invalid_data(format!(
                            "Unsupported cell type {}, expected {} for {} cells",
                            cell_type,
                            S::VTK_CELL_TYPE,
                            S::NAME
                        )));
                    }
                }
            }
            "POINT_DATA" => {
                reader.parse_next::<usize>("point data count")?;
            }
            "SCALARS" => {
                let name = reader.next_token("scalar array name")?.to_string();
                reader.next_token("scalar data type")?;
                if reader.peek() != Some("LOOKUP_TABLE") {
                    let n_components: usize = reader.parse_next("scalar component count")?;
                    if n_components != 1 {
                        return Err(invalid_data(format!(
                            "Unsupported component count {} for scalar array {}",
                            n_components, name
                        )));
                    }
                }
                reader.expect_keyword("LOOKUP_TABLE")?;
                reader.next_token("lookup table name")?;
                let values = (0..nodes.len())
                    .map(|_| reader.parse_float())
                    .collect::<io::Result<_>>()?;
                scalars.insert(name, values);
            }
            "VECTORS" => {
                let name = reader.next_token("vector array name")?.to_string();
                reader.next_token("vector data type")?;
                let values = (0..nodes.len())
                    .map(|_| {
                        let [x, y, z] = reader.parse_float_triple()?;
                        Ok(Vec3::new(x, y, z))
                    })
                    .collect::<io::Result<_>>()?;
                vectors.push((name, values));
            }
            other => {
                return Err(invalid_data(format!(
                    "Unsupported VTK section {}",
                    other
                )))
            }
        }
    }

    if nodes.is_empty() || cells.is_empty() {
        return Err(invalid_data("VTK file contains no points or no cells"));
    }
    let n_nodes = nodes.len();
    if let Some(node) = cells.iter().flatten().find(|&&node| node >= n_nodes) {
        return Err(invalid_data(format!(
            "Cell refers to node {} outside range [0, {})",
            node, n_nodes
        )));
    }

    let vector_idx = vectors
        .iter()
        .position(|(name, _)| name == labels.vector)
        .unwrap_or(0);
    let node_vectors = if vectors.is_empty() {
        vec![Vec3::zero(); n_nodes]
    } else {
        vectors.swap_remove(vector_idx).1
    };
    let node_scalars = scalars
        .remove(labels.scalar)
        .unwrap_or_else(|| vec![F::zero(); n_nodes]);

    let solutions = node_vectors
        .into_iter()
        .zip(node_scalars)
        .map(|(vector, scalar)| Solution::new(vector, scalar))
        .collect();

    Ok(MeshWithSolution {
        mesh: Mesh::new(nodes, cells),
        solutions,
    })
}

struct TokenReader<'a> {
    tokens: Peekable<SplitWhitespace<'a>>,
}

impl<'a> TokenReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().peekable(),
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.tokens.peek().copied()
    }

    fn next_keyword(&mut self) -> Option<&'a str> {
        self.tokens.next()
    }

    fn next_token(&mut self, description: &str) -> io::Result<&'a str> {
        self.tokens.next().ok_or_else(|| {
            invalid_data(format!(
                "Unexpected end of VTK file while reading {}",
                description
            ))
        })
    }

    fn expect_keyword(&mut self, keyword: &str) -> io::Result<()> {
        let token = self.next_token(keyword)?;
        if token == keyword {
            Ok(())
        } else {
            Err(invalid_data(format!(
                "Expected {} in VTK file, found {}",
                keyword, token
            )))
        }
    }

    fn parse_next<T>(&mut self, description: &str) -> io::Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let token = self.next_token(description)?;
        token.parse().map_err(|err| {
            invalid_data(format!(
                "Invalid {} {} in VTK file: {}",
                description, token, err
            ))
        })
    }

    fn parse_float<F: BFloat>(&mut self) -> io::Result<F> {
        self.parse_next::<f64>("floating point value")
            .map(from_f64)
    }

    fn parse_float_triple<F: BFloat>(&mut self) -> io::Result<[F; 3]> {
        Ok([self.parse_float()?, self.parse_float()?, self.parse_float()?])
    }
}
