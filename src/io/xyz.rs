//! Reading and writing point data in extended xyz format.
//!
//! An xyz file starts with a line holding the number of points, followed by
//! a comment line describing the columns, followed by one line per point.

use crate::{
    error::invalid_data,
    geometry::{Dim3::*, Point3},
    num::{from_f64, BFloat},
    sampling::SampleSet,
    tracking::ParticleSet,
};
use std::io::{self, Write};

/// Writes the samples with their ID, position, location marker and solution.
///
/// The marker is 0 for points inside a cell and 1 for points outside the mesh.
pub fn write_sample_set_xyz<F: BFloat, W: Write>(
    sample_set: &SampleSet<F>,
    writer: &mut W,
) -> io::Result<()> {
    let labels = sample_set.labels();
    writeln!(writer, "{}", sample_set.len())?;
    writeln!(
        writer,
        "Interpolation properties=id:I:1:pos:R:3:marker:I:1:{}:R:3:{}:R:1:{}:R:1",
        labels.vector, labels.norm, labels.scalar
    )?;
    for sample in sample_set.samples() {
        let position = &sample.position;
        let solution = &sample.solution;
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {} {} {}",
            sample.id,
            position[X],
            position[Y],
            position[Z],
            if sample.located { 0 } else { 1 },
            solution.vector[X],
            solution.vector[Y],
            solution.vector[Z],
            solution.norm,
            solution.scalar
        )?;
    }
    Ok(())
}

/// Writes the particles with their index, position, velocity and tracked cell
/// (-1 for particles that have left the domain).
pub fn write_particles_xyz<F: BFloat, W: Write>(
    particles: &ParticleSet<F>,
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "{}", particles.len())?;
    writeln!(
        writer,
        "Particles properties=id:I:1:pos:R:3:velocity:R:3:cell:I:1"
    )?;
    for (idx, ((position, velocity), affinity)) in particles
        .positions()
        .iter()
        .zip(particles.velocities())
        .zip(particles.affinities())
        .enumerate()
    {
        let cell = affinity.cell().map_or(-1, |cell| cell as i64);
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {}",
            idx,
            position[X],
            position[Y],
            position[Z],
            velocity[X],
            velocity[Y],
            velocity[Z],
            cell
        )?;
    }
    Ok(())
}

/// Parses the point positions in the given xyz text.
///
/// Each point line must hold either `x y z` or a leading label or ID column
/// followed by `x y z` and optionally more columns.
pub fn parse_points_xyz<F: BFloat>(text: &str) -> io::Result<Vec<Point3<F>>> {
    let mut lines = text.lines();

    let count_line = lines
        .next()
        .ok_or_else(|| invalid_data("Empty xyz file"))?;
    let n_points: usize = count_line
        .trim()
        .parse()
        .map_err(|err| invalid_data(format!("Invalid point count in xyz file: {}", err)))?;

    lines
        .next()
        .ok_or_else(|| invalid_data("Missing comment line in xyz file"))?;

    let points = lines
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(line_idx, line)| parse_point_line(line, line_idx))
        .collect::<io::Result<Vec<_>>>()?;

    if points.len() != n_points {
        return Err(invalid_data(format!(
            "xyz file announces {} points but contains {}",
            n_points,
            points.len()
        )));
    }
    Ok(points)
}

fn parse_point_line<F: BFloat>(line: &str, line_idx: usize) -> io::Result<Point3<F>> {
    let columns: Vec<&str> = line.split_whitespace().collect();
    let coordinate_columns = match columns.len() {
        3 => &columns[..],
        n if n > 3 => &columns[1..4],
        _ => {
            return Err(invalid_data(format!(
                "Too few columns for point {} in xyz file",
                line_idx
            )))
        }
    };
    let mut coordinates = [F::zero(); 3];
    for (coordinate, column) in coordinates.iter_mut().zip(coordinate_columns) {
        let value: f64 = column.parse().map_err(|err| {
            invalid_data(format!(
                "Invalid coordinate {} for point {} in xyz file: {}",
                column, line_idx, err
            ))
        })?;
        *coordinate = from_f64(value);
    }
    Ok(Point3::new(coordinates[0], coordinates[1], coordinates[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        interpolation::Solution,
        sampling::{QuantityLabels, Sample},
    };

    #[test]
    fn sample_lines_have_expected_columns() {
        let set = SampleSet::new(
            vec![
                Sample {
                    id: 0,
                    position: Point3::new(0.5, 1.0, 2.0),
                    cell: 3,
                    located: true,
                    solution: Solution::new(crate::geometry::Vec3::new(3.0, 0.0, 4.0), -1.5),
                },
                Sample {
                    id: 1,
                    position: Point3::new(9.0, 9.0, 9.0),
                    cell: 0,
                    located: false,
                    solution: Solution::filled(1e20),
                },
            ],
            QuantityLabels::electric(),
        );
        let mut output = Vec::new();
        write_sample_set_xyz(&set, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "2");
        assert!(lines[1].contains("elfield:R:3:elfield_norm:R:1:potential:R:1"));
        assert_eq!(lines[2], "0 0.5 1 2 0 3 0 4 5 -1.5");
        assert!(lines[3].starts_with("1 9 9 9 1 "));
    }

    #[test]
    fn points_are_parsed_with_or_without_label_column() {
        let text = "3\ncomment\n0.0 1.0 2.0\nCu 1.5 -2 3e-1 extra\n\n7 4 5 6\n";
        let points: Vec<Point3<f64>> = parse_points_xyz(text).unwrap();
        assert_eq!(
            points,
            vec![
                Point3::new(0.0, 1.0, 2.0),
                Point3::new(1.5, -2.0, 0.3),
                Point3::new(4.0, 5.0, 6.0)
            ]
        );
    }

    #[test]
    fn wrong_point_count_is_rejected() {
        let result = parse_points_xyz::<f64>("2\ncomment\n0 0 0\n");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn malformed_coordinate_is_rejected() {
        assert!(parse_points_xyz::<f64>("1\ncomment\n0 zero 0\n").is_err());
    }
}
