use anyhow::{bail, Context};
use ndarray::Array2;
use ptpcore::noise::NoiseMap;
use std::path::Path;

/// Reads a headerless CSV grid, one image row per line.
///
/// Blank pixels may be written as `nan`; they are masked by the estimator.
pub fn read_noise_map<P: AsRef<Path>>(path: P) -> anyhow::Result<NoiseMap> {
    let path_ref = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path_ref)
        .with_context(|| format!("opening noise map {}", path_ref.display()))?;

    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = 0;
    for (row, record) in rdr.deserialize().enumerate() {
        let pixels: Vec<f64> = record
            .with_context(|| format!("parsing row {} of {}", row + 1, path_ref.display()))?;
        if rows == 0 {
            cols = pixels.len();
        }
        values.extend(pixels);
        rows += 1;
    }
    if rows == 0 || cols == 0 {
        bail!("noise map {} is empty", path_ref.display());
    }

    let data = Array2::from_shape_vec((rows, cols), values)
        .with_context(|| format!("reshaping noise map {}", path_ref.display()))?;
    log::info!("read {}x{} noise map from {}", rows, cols, path_ref.display());
    Ok(NoiseMap::new(data))
}

pub fn write_noise_map<P: AsRef<Path>>(path: P, map: &NoiseMap) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path_ref)
        .with_context(|| format!("creating noise map {}", path_ref.display()))?;
    for row in map.data().rows() {
        wtr.serialize(row.to_vec())?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn grid_is_read_row_major() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"1.0, 2.0, 3.0\n4.0, nan, 6.0\n").unwrap();
        let path = temp.into_temp_path();

        let map = read_noise_map(&path).unwrap();
        assert_eq!(map.dim(), (2, 3));
        assert_eq!(map.data()[[1, 2]], 6.0);
        assert!(map.data()[[1, 1]].is_nan());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"1.0,2.0,3.0\n4.0,5.0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(read_noise_map(&path).is_err());
    }

    #[test]
    fn empty_file_is_rejected() {
        let temp = NamedTempFile::new().unwrap();
        let path = temp.into_temp_path();
        let err = read_noise_map(&path).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn written_map_reads_back() {
        let map = NoiseMap::new(Array2::from_shape_fn((3, 4), |(r, c)| (r * 4 + c) as f64 - 5.5));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.csv");
        write_noise_map(&path, &map).unwrap();
        assert_eq!(read_noise_map(&path).unwrap().data(), map.data());
    }
}
