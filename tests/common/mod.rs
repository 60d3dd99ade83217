use lazy_static::lazy_static;
use meshfield::cli;
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

#[macro_export]
macro_rules! def_test {
    (
        OUT[$($out_ident:ident = $out_str:expr),*]
        fn $name:ident $test_body:expr
    ) => {
        #[test]
        fn $name() {
            let test = common::Test::new();

            $( let $out_ident = test.output_path($out_str); )*

            let test_body = |$( $out_ident, )*| $test_body;

            test_body(
                $( path_str!($out_ident), )*
            );
        }
    };
}

#[macro_export]
macro_rules! path_str {
    ($path:expr) => {
        $path.to_string_lossy().as_ref()
    };
}

pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(COMMAND.clone().get_matches_from(args));
}

pub fn assert_file_exists<P: AsRef<Path>>(file_path: P) {
    let file_path = file_path.as_ref();
    assert!(
        file_path.exists(),
        "File {} does not exist",
        file_path.to_string_lossy()
    );
}

pub fn read_file<P: AsRef<Path>>(file_path: P) -> String {
    let file_path = file_path.as_ref();
    fs::read_to_string(file_path).unwrap_or_else(|err| {
        panic!(
            "Could not read {}: {}",
            file_path.to_string_lossy(),
            err
        )
    })
}

pub fn write_file<P: AsRef<Path>>(file_path: P, content: &str) {
    let file_path = file_path.as_ref();
    fs::write(file_path, content).unwrap_or_else(|err| {
        panic!(
            "Could not write {}: {}",
            file_path.to_string_lossy(),
            err
        )
    });
}

/// Parses the whitespace separated numbers of each point line in an xyz file.
pub fn parse_xyz_rows<P: AsRef<Path>>(file_path: P) -> Vec<Vec<f64>> {
    let text = read_file(file_path);
    let mut lines = text.lines();
    let count: usize = lines.next().unwrap().trim().parse().unwrap();
    lines.next().unwrap();
    let rows: Vec<Vec<f64>> = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|column| column.parse().unwrap())
                .collect()
        })
        .collect();
    assert_eq!(rows.len(), count);
    rows
}

/// The linear function sampled by the test meshes.
pub fn linear_function(x: f64, y: f64, z: f64) -> f64 {
    x + 2.0 * y + 3.0 * z
}

/// VTK text for the unit cube divided into six tetrahedra, with scalar
/// `linear_function` and vector `(1, 2, 3)` at every node.
pub fn unit_cube_mesh_vtk() -> String {
    let mut nodes = Vec::new();
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..2 {
                nodes.push([i as f64, j as f64, k as f64]);
            }
        }
    }
    let cells = [
        [0, 1, 3, 7],
        [0, 1, 5, 7],
        [0, 2, 3, 7],
        [0, 2, 6, 7],
        [0, 4, 5, 7],
        [0, 4, 6, 7],
    ];
    mesh_vtk(&nodes, &cells, 10)
}

/// VTK text for the unit square in the xy-plane split into two triangles.
pub fn unit_square_mesh_vtk() -> String {
    let nodes = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
    ];
    let cells = [[0, 1, 2], [0, 2, 3]];
    mesh_vtk(&nodes, &cells, 5)
}

fn mesh_vtk<const N: usize>(nodes: &[[f64; 3]], cells: &[[usize; N]], cell_type: u8) -> String {
    let mut text = String::from(
        "# vtk DataFile Version 3.0\nTest mesh\nASCII\nDATASET UNSTRUCTURED_GRID\n",
    );
    text.push_str(&format!("POINTS {} double\n", nodes.len()));
    for [x, y, z] in nodes {
        text.push_str(&format!("{} {} {}\n", x, y, z));
    }
    text.push_str(&format!("CELLS {} {}\n", cells.len(), (N + 1) * cells.len()));
    for cell in cells {
        text.push_str(&N.to_string());
        for node in cell {
            text.push_str(&format!(" {}", node));
        }
        text.push('\n');
    }
    text.push_str(&format!("CELL_TYPES {}\n", cells.len()));
    for _ in cells {
        text.push_str(&format!("{}\n", cell_type));
    }
    text.push_str(&format!(
        "POINT_DATA {}\nSCALARS potential double 1\nLOOKUP_TABLE default\n",
        nodes.len()
    ));
    for &[x, y, z] in nodes {
        text.push_str(&format!("{}\n", linear_function(x, y, z)));
    }
    text.push_str("VECTORS elfield double\n");
    for _ in nodes {
        text.push_str("1 2 3\n");
    }
    text
}

/// xyz text for the given points, with a label column.
pub fn points_xyz(points: &[[f64; 3]]) -> String {
    let mut text = format!("{}\nTest points\n", points.len());
    for [x, y, z] in points {
        text.push_str(&format!("P {} {} {}\n", x, y, z));
    }
    text
}

#[derive(Debug)]
pub struct Test {
    output_dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let output_dir = tempfile::tempdir()
            .unwrap_or_else(|err| panic!("Could not create output directory: {}", err));
        Self { output_dir }
    }

    pub fn output_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.path().join(file_name.as_ref())
    }
}

lazy_static! {
    static ref COMMAND: clap::Command<'static> = cli::build::build().no_binary_name(true);
}
