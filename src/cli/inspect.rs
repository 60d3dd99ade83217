//! Command line interface for printing information about a mesh file.

use super::utils::{
    self as cli_utils, create_cell_type_arg, create_quantity_arg, create_verbosity_args,
    parse_cell_type, parse_quantity_labels, parse_verbosity, CellType,
};
use crate::{
    exit_on_error,
    interpolation::{CellShape, InterpolatorConfig, Tetrahedron, Triangle},
    io::{utils::AtomicOutputPath, vtk},
};
use clap::{Arg, ArgMatches, Command};

/// Creates a subcommand for printing information about a mesh file.
pub fn create_inspect_subcommand() -> Command<'static> {
    Command::new("inspect")
        .about("Print information about a mesh file")
        .arg(
            Arg::new("mesh-file")
                .value_name("MESH_FILE")
                .help("Path to the VTK file with the mesh and node solution")
                .required(true)
                .takes_value(true),
        )
        .arg(create_cell_type_arg())
        .arg(create_quantity_arg())
        .arg(
            Arg::new("degeneracy-tolerance")
                .long("degeneracy-tolerance")
                .require_equals(true)
                .value_name("VALUE")
                .help("Relative cell volume below which a cell is considered degenerate")
                .takes_value(true)
                .default_value("1e-10"),
        )
        .arg(
            Arg::new("export-file")
                .long("export-file")
                .require_equals(true)
                .value_name("PATH")
                .help("Write the mesh and node solution as read to a new VTK file")
                .takes_value(true),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Automatically overwrite any existing export file"),
        )
        .args(create_verbosity_args(false))
}

/// Runs the actions for the `inspect` subcommand using the given arguments.
pub fn run_inspect_subcommand(arguments: &ArgMatches) {
    match parse_cell_type(arguments) {
        CellType::Tetrahedron => run_inspection::<Tetrahedron, 4>(arguments),
        CellType::Triangle => run_inspection::<Triangle, 3>(arguments),
    }
}

fn run_inspection<S: CellShape<N>, const N: usize>(arguments: &ArgMatches) {
    let verbosity = parse_verbosity(arguments, false);
    let labels = parse_quantity_labels(arguments);

    let degeneracy_tolerance =
        cli_utils::get_finite_float_value_from_parseable_argument_with_default(
            arguments,
            "degeneracy-tolerance",
            InterpolatorConfig::DEFAULT_DEGENERACY_TOLERANCE,
        );
    cli_utils::verify_non_negative_value("degeneracy-tolerance", degeneracy_tolerance);

    let interpolator = cli_utils::read_interpolator::<S, _, N>(
        cli_utils::get_value_from_required_argument(arguments, "mesh-file"),
        &labels,
        InterpolatorConfig {
            degeneracy_tolerance,
            ..InterpolatorConfig::default()
        },
        &verbosity,
    );
    let mesh = interpolator.mesh();

    println!("cell type: {}", S::NAME);
    println!("nodes: {}", mesh.n_nodes());
    println!("cells: {}", mesh.n_cells());
    println!("degenerate cells: {}", interpolator.n_degenerate_cells());
    println!("bounds: {}", mesh.bounds());

    let n_boundary_faces: usize = (0..mesh.n_cells())
        .map(|cell| {
            mesh.neighbors(cell)
                .iter()
                .filter(|neighbor| neighbor.is_none())
                .count()
        })
        .sum();
    println!("boundary faces: {}", n_boundary_faces);

    if let Some(export_file_path) = arguments.value_of("export-file") {
        let mut atomic_output_path = exit_on_error!(
            AtomicOutputPath::new(export_file_path),
            "Error: Could not create temporary output file: {}"
        );
        exit_on_error!(
            atomic_output_path.ensure_write_allowed(arguments.is_present("overwrite")),
            "Error: {}"
        );
        exit_on_error!(
            atomic_output_path.write_with(|writer| vtk::write_interpolator_vtk(
                &interpolator,
                &labels,
                writer
            )),
            "Error: Could not write export file: {}"
        );
        exit_on_error!(
            atomic_output_path.perform_replace(),
            "Error: Could not move temporary output file to target path: {}"
        );
    }
}
