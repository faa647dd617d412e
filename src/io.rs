use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::{Point3, Point4};

use crate::control_net::{dehomogenize, ControlNet};
use crate::errors::{Result, SurfoError};
use crate::FloatingPoint;

/// Read a control net from a line-oriented text file.
///
/// Each line holds one row of control points along the u direction. Fields
/// within a row are separated by `;`; a field is either `x,y,z` (weight
/// defaults to one) or `x,y,z,w` with the coordinates stored in homogeneous
/// form, divided through by the weight on the way in.
pub fn read_control_points<T, P>(path: P) -> Result<ControlNet<T>>
where
    T: FloatingPoint,
    P: AsRef<Path>,
{
    parse_control_points(BufReader::new(File::open(path)?))
}

/// Parse a control net from any buffered reader; see [`read_control_points`]
/// for the format.
pub fn parse_control_points<T, R>(reader: R) -> Result<ControlNet<T>>
where
    T: FloatingPoint,
    R: BufRead,
{
    let mut points = vec![];
    let mut weights = vec![];

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut point_row = vec![];
        let mut weight_row = vec![];
        for field in line.split(';') {
            let (point, weight) = parse_field(field, index + 1)?;
            point_row.push(point);
            weight_row.push(weight);
        }
        points.push(point_row);
        weights.push(weight_row);
    }

    ControlNet::try_new(points, weights)
}

fn parse_field<T: FloatingPoint>(field: &str, line_number: usize) -> Result<(Point3<T>, T)> {
    let coords = field
        .split(',')
        .map(|c| {
            let c = c.trim();
            c.parse::<f64>().map(|v| T::from_f64(v).unwrap()).map_err(|_| {
                SurfoError::InvalidInput(format!(
                    "line {}: malformed coordinate {:?}",
                    line_number, c
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    match coords[..] {
        [x, y, z] => Ok((Point3::new(x, y, z), T::one())),
        [x, y, z, w] => Ok((dehomogenize(&Point4::new(x, y, z, w))?, w)),
        _ => Err(SurfoError::InvalidInput(format!(
            "line {}: expected 3 or 4 components per control point, got {}",
            line_number,
            coords.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    use super::{parse_control_points, read_control_points};
    use crate::errors::SurfoError;

    #[test]
    fn parses_plain_rows() {
        let data = b"0,0,0; 0,1,0\n1,0,0; 1,1,0\n";
        let net = parse_control_points::<f64, _>(&data[..]).unwrap();
        assert_eq!(net.size_u(), 2);
        assert_eq!(net.size_v(), 2);
        assert_eq!(*net.point(1, 0), Point3::new(1., 0., 0.));
        assert_eq!(net.flattened_weights(), vec![1.; 4]);
    }

    #[test]
    fn parses_weighted_rows() {
        // stored homogeneous: (0, 2, 0, 2) is position (0, 1, 0) with weight 2
        let data = b"0,0,0,1; 0,2,0,2\n1,0,0,1; 4,4,0,4\n";
        let net = parse_control_points::<f64, _>(&data[..]).unwrap();
        assert_relative_eq!(*net.point(0, 1), Point3::new(0., 1., 0.), epsilon = 1e-12);
        assert_relative_eq!(*net.point(1, 1), Point3::new(1., 1., 0.), epsilon = 1e-12);
        assert_eq!(net.weight(0, 1), 2.);
        assert_eq!(net.weight(1, 1), 4.);
    }

    #[test]
    fn rejects_malformed_coordinate() {
        let data = b"0,0,zero\n";
        assert!(matches!(
            parse_control_points::<f64, _>(&data[..]),
            Err(SurfoError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_zero_weight() {
        let data = b"0,0,0,0\n";
        assert!(matches!(
            parse_control_points::<f64, _>(&data[..]),
            Err(SurfoError::DivisionByZero(_))
        ));
    }

    #[test]
    fn rejects_ragged_rows() {
        let data = b"0,0,0; 0,1,0\n1,0,0\n";
        assert!(parse_control_points::<f64, _>(&data[..]).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_control_points::<f64, _>("/nonexistent/ctrlpts.txt");
        assert!(matches!(result, Err(SurfoError::Io(_))));
    }
}
