//! Command line interface for sampling a mesh solution at a set of points.

use super::utils::{
    self as cli_utils, create_cell_type_arg, create_quantity_arg, create_verbosity_args,
    parse_cell_type, parse_quantity_labels, parse_verbosity, CellType,
};
use crate::{
    exit_on_error, exit_on_false, exit_with_error,
    interpolation::{
        fip, CellShape, InterpolatorConfig, Tetrahedron, Triangle, UnlocatedPolicy,
    },
    io::{
        utils::{self as io_utils, AtomicOutputPath},
        vtk, xyz,
    },
    sampling::{self, statistics, SampleSet, SampledQuantity, SamplingConfig},
};
use clap::{Arg, ArgMatches, Command};
use std::{io, path::Path};

/// Creates a subcommand for sampling a mesh solution at a set of points.
pub fn create_sample_subcommand() -> Command<'static> {
    Command::new("sample")
        .about("Interpolate a mesh node solution at a set of points")
        .long_about(
            "Interpolate a mesh node solution at a set of points.\n\
             The mesh and its node solution are read from a VTK unstructured grid file\n\
             and the points from an xyz file. The output format is determined by the\n\
             extension of the output file (xyz, vtk, json or pickle).",
        )
        .arg(
            Arg::new("mesh-file")
                .value_name("MESH_FILE")
                .help("Path to the VTK file with the mesh and node solution")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("points-file")
                .value_name("POINTS_FILE")
                .help("Path to the xyz file with the points to sample")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("output-file")
                .value_name("OUTPUT_FILE")
                .help("Path of the output file to create")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Automatically overwrite any existing output file"),
        )
        .arg(create_cell_type_arg())
        .arg(create_quantity_arg())
        .arg(
            Arg::new("component")
                .long("component")
                .value_name("NAME")
                .help("Part of the node solution to interpolate")
                .takes_value(true)
                .possible_values(["solution", "vector", "scalar"])
                .default_value("solution"),
        )
        .arg(
            Arg::new("no-sorting")
                .long("no-sorting")
                .help("Visit the points in input order instead of Hilbert curve order"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Only accept points strictly inside a cell"),
        )
        .arg(
            Arg::new("tolerance")
                .long("tolerance")
                .require_equals(true)
                .value_name("VALUE")
                .help("Slack allowed on barycentric coordinates when testing containment")
                .takes_value(true)
                .default_value("0.1"),
        )
        .arg(
            Arg::new("depth")
                .long("depth")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of face-neighbour rings to search around the previous cell")
                .takes_value(true)
                .default_value("2"),
        )
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
            Arg::new("sentinel")
                .long("sentinel")
                .require_equals(true)
                .value_name("VALUE")
                .help("Value written for points outside the mesh")
                .takes_value(true)
                .default_value("1e20"),
        )
        .arg(
            Arg::new("extrapolate-unlocated")
                .long("extrapolate-unlocated")
                .help("Extrapolate from the nearest cell for points outside the mesh"),
        )
        .arg(
            Arg::new("cleaning-cutoff")
                .long("cleaning-cutoff")
                .require_equals(true)
                .value_name("RADIUS")
                .help("Neighbourhood radius for replacing outliers [default: no cleaning]")
                .takes_value(true),
        )
        .arg(
            Arg::new("bin-divisor")
                .long("bin-divisor")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of samples per histogram bin for outlier detection")
                .takes_value(true)
                .default_value("250"),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of consecutive points handled by each parallel task")
                .takes_value(true)
                .default_value("256"),
        )
        .arg(
            Arg::new("statistics")
                .long("statistics")
                .help("Print statistics of the sampled solution"),
        )
        .arg(
            Arg::new("reference-norm")
                .long("reference-norm")
                .require_equals(true)
                .value_name("VALUE")
                .help("Reference vector norm for computing the field enhancement")
                .takes_value(true),
        )
        .arg(
            Arg::new("hemiellipsoid")
                .long("hemiellipsoid")
                .require_equals(true)
                .use_value_delimiter(true)
                .number_of_values(2)
                .value_names(&["BASE_RADIUS", "HEIGHT"])
                .help("Also print the analytical field enhancement at the apex of the given hemi-ellipsoid")
                .takes_value(true),
        )
        .args(create_verbosity_args(true))
}

/// Runs the actions for the `sample` subcommand using the given arguments.
pub fn run_sample_subcommand(arguments: &ArgMatches) {
    match parse_cell_type(arguments) {
        CellType::Tetrahedron => run_sampling::<Tetrahedron, 4>(arguments),
        CellType::Triangle => run_sampling::<Triangle, 3>(arguments),
    }
}

fn run_sampling<S: CellShape<N>, const N: usize>(arguments: &ArgMatches) {
    let verbosity = parse_verbosity(arguments, true);
    let labels = parse_quantity_labels(arguments);
    let interpolator_config = construct_interpolator_config_from_arguments(arguments);
    let sampling_config = construct_sampling_config_from_arguments(arguments);

    let output_file_path = Path::new(cli_utils::get_value_from_required_argument(
        arguments,
        "output-file",
    ));
    let mut atomic_output_path = exit_on_error!(
        AtomicOutputPath::new(output_file_path),
        "Error: Could not create temporary output file: {}"
    );
    exit_on_error!(
        atomic_output_path.ensure_write_allowed(arguments.is_present("overwrite")),
        "Error: {}"
    );
    let output_format = OutputFormat::from_path(output_file_path);

    let interpolator = cli_utils::read_interpolator::<S, _, N>(
        cli_utils::get_value_from_required_argument(arguments, "mesh-file"),
        &labels,
        interpolator_config,
        &verbosity,
    );

    let points_text = exit_on_error!(
        io_utils::read_text_file(cli_utils::get_value_from_required_argument(
            arguments,
            "points-file"
        )),
        "Error: Could not read points file: {}"
    );
    let points = exit_on_error!(
        xyz::parse_points_xyz::<fip>(&points_text),
        "Error: Could not parse points file: {}"
    );

    if verbosity.print_messages() {
        println!("Sampling {} points", points.len());
    }
    let sample_set = sampling::sample_points(
        &interpolator,
        &points,
        &sampling_config,
        labels,
        &verbosity,
    );

    if arguments.is_present("statistics") {
        print_statistics(&sample_set, arguments);
    }

    if verbosity.print_messages() {
        println!("Writing {}", output_file_path.display());
    }
    exit_on_error!(
        atomic_output_path.write_with(|writer| output_format.write(&sample_set, writer)),
        "Error: Could not write output file: {}"
    );
    exit_on_error!(
        atomic_output_path.perform_replace(),
        "Error: Could not move temporary output file to target path: {}"
    );
}

fn construct_interpolator_config_from_arguments(arguments: &ArgMatches) -> InterpolatorConfig {
    let search_outside_tolerance =
        cli_utils::get_finite_float_value_from_parseable_argument_with_default(
            arguments,
            "tolerance",
            InterpolatorConfig::DEFAULT_SEARCH_OUTSIDE_TOLERANCE,
        );
    let neighbor_search_depth = cli_utils::get_value_from_parseable_argument_with_default(
        arguments,
        "depth",
        InterpolatorConfig::DEFAULT_NEIGHBOR_SEARCH_DEPTH,
    );
    let degeneracy_tolerance =
        cli_utils::get_finite_float_value_from_parseable_argument_with_default(
            arguments,
            "degeneracy-tolerance",
            InterpolatorConfig::DEFAULT_DEGENERACY_TOLERANCE,
        );
    let error_sentinel_magnitude: fip =
        cli_utils::get_finite_float_value_from_parseable_argument_with_default(
            arguments,
            "sentinel",
            InterpolatorConfig::DEFAULT_ERROR_SENTINEL_MAGNITUDE,
        );
    let histogram_bin_divisor = cli_utils::get_value_from_parseable_argument_with_default(
        arguments,
        "bin-divisor",
        InterpolatorConfig::DEFAULT_HISTOGRAM_BIN_DIVISOR,
    );
    let cleaning_cutoff_radius =
        cli_utils::get_finite_float_value_from_parseable_argument_with_default(
            arguments,
            "cleaning-cutoff",
            InterpolatorConfig::DEFAULT_CLEANING_CUTOFF_RADIUS,
        );

    cli_utils::verify_positive_value("sentinel", error_sentinel_magnitude);
    cli_utils::verify_positive_value("bin-divisor", histogram_bin_divisor);
    cli_utils::verify_non_negative_value("tolerance", search_outside_tolerance);
    cli_utils::verify_non_negative_value("degeneracy-tolerance", degeneracy_tolerance);
    cli_utils::verify_non_negative_value("cleaning-cutoff", cleaning_cutoff_radius);

    let search_outside_tolerance = if arguments.is_present("strict") {
        0.0
    } else {
        search_outside_tolerance
    };

    InterpolatorConfig {
        search_outside_tolerance,
        neighbor_search_depth,
        degeneracy_tolerance,
        error_sentinel_magnitude,
        histogram_bin_divisor,
        cleaning_cutoff_radius,
        unlocated_policy: if arguments.is_present("extrapolate-unlocated") {
            UnlocatedPolicy::Extrapolate
        } else {
            UnlocatedPolicy::Sentinel
        },
    }
}

fn construct_sampling_config_from_arguments(arguments: &ArgMatches) -> SamplingConfig {
    let quantity = cli_utils::get_value_from_constrained_argument_with_default(
        arguments,
        "component",
        &["solution", "vector", "scalar"],
        &[
            SampledQuantity::Solution,
            SampledQuantity::Vector,
            SampledQuantity::Scalar,
        ],
        SampledQuantity::Solution,
    );
    let chunk_size = cli_utils::get_value_from_parseable_argument_with_default(
        arguments,
        "chunk-size",
        SamplingConfig::DEFAULT_CHUNK_SIZE,
    );
    cli_utils::verify_positive_value("chunk-size", chunk_size);

    SamplingConfig {
        quantity,
        spatial_sorting: !arguments.is_present("no-sorting"),
        search_outside: !arguments.is_present("strict"),
        chunk_size,
    }
}

fn print_statistics(sample_set: &SampleSet<fip>, arguments: &ArgMatches) {
    match sample_set.statistics() {
        Some(solution_statistics) => println!("{}", solution_statistics),
        None => {
            eprintln!("Warning: No points were inside the mesh, so no statistics are available");
            return;
        }
    }
    if let Some(reference_norm) =
        cli_utils::get_value_from_parseable_argument::<fip>(arguments, "reference-norm")
    {
        cli_utils::verify_finite_float_value("reference-norm", reference_norm);
        if let Some(enhancement) = sample_set.field_enhancement(reference_norm) {
            println!("field enhancement: {}", enhancement);
        }
    }
    if let Some(values) = arguments.values_of("hemiellipsoid") {
        let values: Vec<fip> = values
            .map(|value_string| cli_utils::parse_value_string("hemiellipsoid", value_string))
            .collect();
        if let [base_radius, height] = values[..] {
            exit_on_false!(
                base_radius > 0.0 && height > 0.0,
                "Error: hemiellipsoid dimensions must be larger than zero"
            );
            println!(
                "analytical hemi-ellipsoid field enhancement: {}",
                statistics::hemiellipsoid_enhancement(base_radius, height)
            );
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Xyz,
    Vtk,
    #[cfg(feature = "json")]
    Json,
    #[cfg(feature = "pickle")]
    Pickle,
}

impl OutputFormat {
    fn from_path(file_path: &Path) -> Self {
        let extension = file_path
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or_default();
        match extension {
            "xyz" => Self::Xyz,
            "vtk" => Self::Vtk,
            #[cfg(feature = "json")]
            "json" => Self::Json,
            #[cfg(feature = "pickle")]
            "pickle" => Self::Pickle,
            _ => exit_with_error!(
                "Error: Unsupported output file extension: {}",
                file_path.display()
            ),
        }
    }

    fn write<W: io::Write>(&self, sample_set: &SampleSet<fip>, writer: &mut W) -> io::Result<()> {
        match self {
            Self::Xyz => xyz::write_sample_set_xyz(sample_set, writer),
            Self::Vtk => vtk::write_sample_set_vtk(sample_set, writer),
            #[cfg(feature = "json")]
            Self::Json => io_utils::write_data_as_json(writer, sample_set),
            #[cfg(feature = "pickle")]
            Self::Pickle => io_utils::write_data_as_pickle(writer, sample_set),
        }
    }
}
