//! Utilities for creating the command line interface.

use crate::{
    exit_on_error, exit_on_false, exit_with_error,
    interpolation::{fip, CellShape, InterpolatorConfig, LinearInterpolator},
    io::{utils as io_utils, vtk, Verbosity},
    num::BFloat,
    sampling::QuantityLabels,
};
use clap::{Arg, ArgMatches};
use indicatif::ProgressStyle;
use lazy_static::lazy_static;
use std::{path::Path, str::FromStr, sync::Arc};

lazy_static! {
    static ref DEFAULT_PROGRESS_STYLE: ProgressStyle =
        ProgressStyle::with_template("Progress: {bar:40}  {percent}% | ETA: {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
}

/// Creates the `--verbose` argument, and the `--progress` argument if progress
/// reporting is supported.
pub fn create_verbosity_args(support_progress: bool) -> Vec<Arg<'static>> {
    let mut args = vec![Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Print status messages")];
    if support_progress {
        args.push(
            Arg::new("progress")
                .short('p')
                .long("progress")
                .help("Show progress bars"),
        );
    }
    args
}

pub fn parse_verbosity(arguments: &ArgMatches, support_progress: bool) -> Verbosity {
    if support_progress && arguments.is_present("progress") {
        Verbosity::Progress(DEFAULT_PROGRESS_STYLE.clone())
    } else if arguments.is_present("verbose") {
        Verbosity::Messages
    } else {
        Verbosity::Quiet
    }
}

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

pub fn get_value_from_required_argument<'a>(
    arguments: &'a ArgMatches,
    argument_name: &str,
) -> &'a str {
    arguments
        .value_of(argument_name)
        .unwrap_or_else(|| exit_with_error!("Error: No value for {}", argument_name))
}

pub fn get_value_from_parseable_argument<T>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> Option<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    arguments
        .value_of(argument_name)
        .map(|value_string| parse_value_string(argument_name, value_string))
}

pub fn get_value_from_parseable_argument_with_default<T>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_value: T,
) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    get_value_from_parseable_argument(arguments, argument_name).unwrap_or(default_value)
}

pub fn get_finite_float_value_from_parseable_argument_with_default<F>(
    arguments: &ArgMatches,
    argument_name: &str,
    default_value: F,
) -> F
where
    F: BFloat + FromStr,
    <F as FromStr>::Err: std::fmt::Display,
{
    let value =
        get_value_from_parseable_argument_with_default(arguments, argument_name, default_value);
    verify_finite_float_value(argument_name, value);
    value
}

pub fn verify_finite_float_value<F: BFloat>(argument_name: &str, value: F) {
    exit_on_false!(value.is_finite(), "Error: {} must be finite", argument_name);
}

pub fn verify_positive_value<T: PartialOrd + Default>(argument_name: &str, value: T) {
    exit_on_false!(
        value > T::default(),
        "Error: {} must be larger than zero",
        argument_name
    );
}

pub fn verify_non_negative_value<F: BFloat>(argument_name: &str, value: F) {
    exit_on_false!(
        value >= F::zero(),
        "Error: {} must be non-negative",
        argument_name
    );
}

/// Returns the value among the possible values whose name matches the value
/// of the given argument, or the given default if the argument is absent.
pub fn get_value_from_constrained_argument_with_default<T>(
    arguments: &ArgMatches,
    argument_name: &str,
    possible_value_strings: &[&str],
    possible_values: &[T],
    default_value: T,
) -> T
where
    T: Copy,
{
    match arguments.value_of(argument_name) {
        Some(value_string) => possible_value_strings
            .iter()
            .zip(possible_values)
            .find(|(possible_value_string, _)| **possible_value_string == value_string)
            .map(|(_, &possible_value)| possible_value)
            .unwrap_or_else(|| {
                exit_with_error!(
                    "Error: Invalid value for {}: {}",
                    argument_name,
                    value_string
                )
            }),
        None => default_value,
    }
}

/// Shape of the cells in an input mesh file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellType {
    Tetrahedron,
    Triangle,
}

pub fn create_cell_type_arg() -> Arg<'static> {
    Arg::new("cell-type")
        .long("cell-type")
        .value_name("TYPE")
        .help("Shape of the mesh cells")
        .takes_value(true)
        .possible_values(["tetrahedron", "triangle"])
        .default_value("tetrahedron")
}

pub fn parse_cell_type(arguments: &ArgMatches) -> CellType {
    get_value_from_constrained_argument_with_default(
        arguments,
        "cell-type",
        &["tetrahedron", "triangle"],
        &[CellType::Tetrahedron, CellType::Triangle],
        CellType::Tetrahedron,
    )
}

pub fn create_quantity_arg() -> Arg<'static> {
    Arg::new("quantity")
        .long("quantity")
        .value_name("NAME")
        .help("Physical quantity of the node solution, used for naming output channels")
        .takes_value(true)
        .possible_values(["electric", "heat", "generic"])
        .default_value("electric")
}

pub fn parse_quantity_labels(arguments: &ArgMatches) -> QuantityLabels {
    get_value_from_constrained_argument_with_default(
        arguments,
        "quantity",
        &["electric", "heat", "generic"],
        &[
            QuantityLabels::electric(),
            QuantityLabels::heat(),
            QuantityLabels::generic(),
        ],
        QuantityLabels::electric(),
    )
}

/// Reads a VTK mesh file with a node solution and sets up an interpolator for it.
pub fn read_interpolator<S, P, const N: usize>(
    mesh_file_path: P,
    labels: &QuantityLabels,
    config: InterpolatorConfig,
    verbosity: &Verbosity,
) -> LinearInterpolator<fip, S, N>
where
    S: CellShape<N>,
    P: AsRef<Path>,
{
    let mesh_file_path = mesh_file_path.as_ref();
    if verbosity.print_messages() {
        println!("Reading {}", mesh_file_path.display());
    }
    let text = exit_on_error!(
        io_utils::read_text_file(mesh_file_path),
        "Error: Could not read mesh file: {}"
    );
    let vtk::MeshWithSolution { mesh, solutions } = exit_on_error!(
        vtk::parse_mesh_vtk::<fip, S, N>(&text, labels),
        "Error: Could not parse mesh file: {}"
    );
    if verbosity.print_messages() {
        println!(
            "Read mesh with {} nodes and {} {} cells",
            mesh.n_nodes(),
            mesh.n_cells(),
            S::NAME
        );
    }
    LinearInterpolator::new(Arc::new(mesh), solutions, config, verbosity)
}
