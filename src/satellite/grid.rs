//! Gridded satellite data as decoded from a level-3 granule, and its
//! flattening into matched (lat, lon, value, quality) points.

use crate::satellite::error::SatelliteError;
use serde::Serialize;

/// One cell of a satellite grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
    pub quality_flag: i32,
}

/// Coordinate axes of a grid.
#[derive(Debug, Clone, PartialEq)]
pub enum GridAxes {
    /// One latitude per row and one longitude per column. Expanded into a full
    /// mesh (outer product) before use.
    Vectors {
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    },
    /// Per-cell latitude and longitude, row-major, `rows * cols` long each.
    Mesh {
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
        rows: usize,
        cols: usize,
    },
}

impl GridAxes {
    /// Number of spatial cells.
    pub fn cell_count(&self) -> usize {
        match self {
            GridAxes::Vectors {
                latitudes,
                longitudes,
            } => latitudes.len() * longitudes.len(),
            GridAxes::Mesh { rows, cols, .. } => rows * cols,
        }
    }

    /// Row-major per-cell latitude and longitude meshes.
    pub fn mesh(&self) -> Result<(Vec<f64>, Vec<f64>), SatelliteError> {
        match self {
            GridAxes::Vectors {
                latitudes,
                longitudes,
            } => {
                let cells = latitudes.len() * longitudes.len();
                let mut lat_mesh = Vec::with_capacity(cells);
                let mut lon_mesh = Vec::with_capacity(cells);
                for &lat in latitudes {
                    for &lon in longitudes {
                        lat_mesh.push(lat);
                        lon_mesh.push(lon);
                    }
                }
                Ok((lat_mesh, lon_mesh))
            }
            GridAxes::Mesh {
                latitudes,
                longitudes,
                rows,
                cols,
            } => {
                let cells = rows * cols;
                if latitudes.len() != cells || longitudes.len() != cells {
                    return Err(SatelliteError::ShapeMismatch(format!(
                        "mesh of {rows}x{cols} needs {cells} coordinates, got {} latitudes and {} longitudes",
                        latitudes.len(),
                        longitudes.len()
                    )));
                }
                Ok((latitudes.clone(), longitudes.clone()))
            }
        }
    }
}

/// An n-dimensional array stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> GridArray<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self, SatelliteError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(SatelliteError::ShapeMismatch(format!(
                "shape {shape:?} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// The spatial slice of the array. A leading time axis is reduced to its
    /// first slice; no temporal averaging happens.
    pub fn first_time_slice(&self, cells: usize) -> Result<&[T], SatelliteError> {
        if self.data.len() == cells {
            return Ok(&self.data);
        }
        let per_slice: usize = self.shape.iter().skip(1).product();
        if self.shape.len() >= 2 && per_slice == cells && self.data.len() >= cells {
            return Ok(&self.data[..cells]);
        }
        Err(SatelliteError::ShapeMismatch(format!(
            "array of shape {:?} does not cover {cells} grid cells",
            self.shape
        )))
    }
}

/// Everything the locator needs from one decoded granule.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteGrid {
    pub axes: GridAxes,
    /// Tropospheric column values.
    pub values: GridArray<f64>,
    /// Main data quality flag per cell, 0 = best.
    pub quality: GridArray<i32>,
    /// Declared `_FillValue` of the value variable, if any.
    pub fill_value: Option<f64>,
    pub unit: String,
}

impl SatelliteGrid {
    /// Flattens the grid into matched points, row-major.
    pub fn points(&self) -> Result<Vec<GridPoint>, SatelliteError> {
        let cells = self.axes.cell_count();
        let (lat_mesh, lon_mesh) = self.axes.mesh()?;
        let values = self.values.first_time_slice(cells)?;
        let quality = self.quality.first_time_slice(cells)?;

        Ok(lat_mesh
            .into_iter()
            .zip(lon_mesh)
            .zip(values.iter().zip(quality))
            .map(|((latitude, longitude), (&value, &quality_flag))| GridPoint {
                latitude,
                longitude,
                value,
                quality_flag,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_axes_expand_row_major() {
        let axes = GridAxes::Vectors {
            latitudes: vec![10.0, 20.0],
            longitudes: vec![-1.0, -2.0, -3.0],
        };
        let (lat, lon) = axes.mesh().unwrap();
        assert_eq!(lat, [10.0, 10.0, 10.0, 20.0, 20.0, 20.0]);
        assert_eq!(lon, [-1.0, -2.0, -3.0, -1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_time_axis_uses_first_slice() {
        let grid = SatelliteGrid {
            axes: GridAxes::Vectors {
                latitudes: vec![1.0],
                longitudes: vec![2.0, 3.0],
            },
            values: GridArray::new(vec![2, 1, 2], vec![5.0, 6.0, 7.0, 8.0]).unwrap(),
            quality: GridArray::new(vec![1, 1, 2], vec![0, 1]).unwrap(),
            fill_value: None,
            unit: "molecules/cm^2".into(),
        };
        let points = grid.points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].value, 5.0);
        assert_eq!(points[1].value, 6.0);
        assert_eq!(points[1].longitude, 3.0);
        assert_eq!(points[1].quality_flag, 1);
    }

    #[test]
    fn test_mesh_axes_used_as_is() {
        let grid = SatelliteGrid {
            axes: GridAxes::Mesh {
                latitudes: vec![1.0, 1.1, 2.0, 2.1],
                longitudes: vec![5.0, 6.0, 5.0, 6.0],
                rows: 2,
                cols: 2,
            },
            values: GridArray::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            quality: GridArray::new(vec![2, 2], vec![0, 0, 0, 0]).unwrap(),
            fill_value: None,
            unit: String::new(),
        };
        let points = grid.points().unwrap();
        assert_eq!(points[3].latitude, 2.1);
        assert_eq!(points[3].value, 4.0);
    }

    #[test]
    fn test_shape_mismatch_is_reported() {
        assert!(GridArray::new(vec![2, 2], vec![1.0; 3]).is_err());

        let grid = SatelliteGrid {
            axes: GridAxes::Vectors {
                latitudes: vec![1.0, 2.0],
                longitudes: vec![1.0, 2.0],
            },
            values: GridArray::new(vec![3], vec![1.0; 3]).unwrap(),
            quality: GridArray::new(vec![4], vec![0; 4]).unwrap(),
            fill_value: None,
            unit: String::new(),
        };
        assert!(matches!(grid.points(), Err(SatelliteError::ShapeMismatch(_))));
    }

    #[test]
    fn test_empty_time_axis_is_shape_mismatch() {
        let grid = SatelliteGrid {
            axes: GridAxes::Vectors {
                latitudes: vec![1.0, 2.0],
                longitudes: vec![3.0, 4.0],
            },
            values: GridArray::new(vec![0, 2, 2], vec![]).unwrap(),
            quality: GridArray::new(vec![1, 2, 2], vec![0; 4]).unwrap(),
            fill_value: None,
            unit: String::new(),
        };
        assert!(matches!(grid.points(), Err(SatelliteError::ShapeMismatch(_))));
    }
}
