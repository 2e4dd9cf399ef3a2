use crate::error::CsvError;
use crate::MuseumRecord;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const BOM: &str = "\u{feff}";

/// A CSV file held in memory. Later pipeline stages work on this so columns
/// they do not know about pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of `name` in row `row`, empty when the column does not exist.
    pub fn get(&self, row: usize, name: &str) -> &str {
        self.column(name)
            .and_then(|idx| self.rows.get(row)?.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Index of `name`, appending an empty column first if it is missing.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn read_table(path: &Path) -> Result<Table, CsvError> {
    let display = path.display().to_string();
    let mut raw = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut raw))
        .map_err(|source| CsvError::Io {
            path: display.clone(),
            source,
        })?;
    let text = raw.strip_prefix(BOM).unwrap_or(&raw);

    let csv_error = |source| CsvError::Csv {
        path: display.clone(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(csv_error)?;
        if record.len() != headers.len() {
            return Err(CsvError::Ragged {
                path: display.clone(),
                row: idx + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Writes the table as UTF-8 with a BOM so spreadsheet tools pick the encoding.
pub fn write_table(table: &Table, path: &Path) -> Result<(), CsvError> {
    let display = path.display().to_string();
    let io_error = |source| CsvError::Io {
        path: display.clone(),
        source,
    };
    let csv_error = |source| CsvError::Csv {
        path: display.clone(),
        source,
    };

    let mut file = BufWriter::new(File::create(path).map_err(io_error)?);
    file.write_all(BOM.as_bytes()).map_err(io_error)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.headers).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error)?;

    println!("✅ {} creado.", display);
    Ok(())
}

pub fn save_records(records: &[MuseumRecord], path: &Path) -> Result<(), CsvError> {
    let table = Table {
        headers: MuseumRecord::HEADERS.iter().map(|h| h.to_string()).collect(),
        rows: records.iter().map(MuseumRecord::to_row).collect(),
    };
    write_table(&table, path)
}

/// `fmt` subscriber filtered by `RUST_LOG`, `info` when unset.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtractedFields, MuseumListing};

    fn record(name: &str, resumen: Option<&str>) -> MuseumRecord {
        let listing = MuseumListing {
            name: name.to_string(),
            url: format!("https://sic.cultura.gob.mx/ficha.php?table=museo&table_id={}", name.len()),
        };
        MuseumRecord::new(
            &listing,
            ExtractedFields {
                calle: Some("Av. Hidalgo 289, \"Centro\"".into()),
                resumen: resumen.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("museos_cdmx_ia.csv");
        let records = vec![
            record("Museo Nacional de Arte", Some("Arte mexicano,\nsiglos XVI a XX.")),
            record("Museo del Estanquillo", None),
        ];

        save_records(&records, &path).unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert!(raw.starts_with(BOM.as_bytes()));

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers, MuseumRecord::HEADERS);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "resumen"), "Arte mexicano,\nsiglos XVI a XX.");
        assert_eq!(table.get(0, "calle"), "Av. Hidalgo 289, \"Centro\"");
        assert_eq!(table.get(1, "resumen"), "");
    }

    #[test]
    fn table_round_trip_keeps_extra_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("museos_cdmx_con_categorias.csv");
        let table = Table {
            headers: vec!["nombre_oficial".into(), "latitud".into(), "categoria".into()],
            rows: vec![
                vec!["Museo Soumaya".into(), "19.4406".into(), "Arte".into()],
                vec!["Universum".into(), "".into(), "Ciencia".into()],
            ],
        };

        write_table(&table, &path).unwrap();

        assert_eq!(read_table(&path).unwrap(), table);
    }

    #[test]
    fn reads_files_without_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "nombre_oficial,resumen\nMuseo Tamayo,Arte contemporáneo\n").unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.headers[0], "nombre_oficial");
        assert_eq!(table.get(0, "resumen"), "Arte contemporáneo");
        assert_eq!(table.get(0, "categoria"), "");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();

        let err = read_table(&path).unwrap_err();
        assert!(matches!(err, CsvError::Ragged { row: 2, expected: 2, found: 1, .. }));
    }

    #[test]
    fn ensure_column_pads_rows() {
        let mut table = Table {
            headers: vec!["nombre_oficial".into()],
            rows: vec![vec!["Museo Dolores Olmedo".into()]],
        };
        assert_eq!(table.ensure_column("latitud"), 1);
        assert_eq!(table.ensure_column("latitud"), 1);
        assert_eq!(table.rows[0], vec!["Museo Dolores Olmedo".to_string(), String::new()]);
    }
}
