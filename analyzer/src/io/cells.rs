use anyhow::Context;
use ptpcore::cells::CellRecord;
use std::path::Path;

/// Reads the cell table; unknown columns are ignored.
pub fn read_cells<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<CellRecord>> {
    let path_ref = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path_ref)
        .with_context(|| format!("opening cell table {}", path_ref.display()))?;

    let mut cells = Vec::new();
    for (row, record) in rdr.deserialize().enumerate() {
        let cell: CellRecord = record
            .with_context(|| format!("parsing row {} of {}", row + 1, path_ref.display()))?;
        cells.push(cell);
    }
    log::info!("read {} cells from {}", cells.len(), path_ref.display());
    Ok(cells)
}

pub fn write_cells<P: AsRef<Path>>(path: P, cells: &[CellRecord]) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    let mut wtr = csv::Writer::from_path(path_ref)
        .with_context(|| format!("creating cell table {}", path_ref.display()))?;
    for cell in cells {
        wtr.serialize(cell)?;
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
    fn read_cells_maps_named_columns() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"cell_id,radio1_sb,radio1_sb_err,xray_sb,xray_sb_err,y_sb,y_sb_err\n\
              1,2.5e-6,1e-7,3e-6,2e-7,1.2e-5,1e-6\n\
              2,nan,1e-7,3e-6,2e-7,,\n",
        )
        .unwrap();
        let path = temp.into_temp_path();

        let cells = read_cells(&path).unwrap();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].radio_sb, 2.5e-6);
        assert_eq!(cells[0].y_sb, Some(1.2e-5));
        assert!(cells[1].radio_sb.is_nan());
        assert_eq!(cells[1].y_sb, None);
    }

    #[test]
    fn sz_columns_are_optional() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"radio1_sb,radio1_sb_err,xray_sb,xray_sb_err\n1.0,0.1,2.0,0.2\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cells = read_cells(&path).unwrap();
        assert_eq!(cells[0].y_sb_err, None);
    }

    #[test]
    fn written_table_reads_back() {
        let cells = vec![CellRecord {
            radio_sb: 1.0,
            radio_sb_err: 0.1,
            xray_sb: 2.0,
            xray_sb_err: 0.2,
            y_sb: Some(3.0),
            y_sb_err: Some(0.3),
        }];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cells.csv");
        write_cells(&path, &cells).unwrap();
        assert_eq!(read_cells(&path).unwrap(), cells);
    }

    #[test]
    fn malformed_row_names_the_row() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"radio1_sb,radio1_sb_err,xray_sb,xray_sb_err\n1.0,0.1,abc,0.2\n")
            .unwrap();
        let path = temp.into_temp_path();
        let err = read_cells(&path).unwrap_err();
        assert!(format!("{err:#}").contains("row 1"));
    }
}
