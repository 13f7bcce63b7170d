//! Vector label files: per-region population records with their geometry.

use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use crate::error::{DatasetError, DatasetResult};

pub const INDEX_COLUMN: &str = "Index";
pub const POPULATION_COLUMN: &str = "Population";

/// Geometry of one region, as stored in a GeoPackage blob
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub srs_id: i32,
    /// Standard WKB with the GeoPackage header stripped
    pub wkb: Vec<u8>,
}

impl Geometry {
    /// Parse a GeoPackage binary geometry.
    ///
    /// Layout: magic `GP`, version, flags, SRS id (4 bytes in the byte order
    /// given by flag bit 0), an envelope sized by flag bits 1-3, then WKB.
    pub fn from_gpkg_blob(blob: &[u8]) -> Result<Self, String> {
        if blob.len() < 8 || &blob[0..2] != b"GP" {
            return Err("missing GeoPackage geometry header".to_string());
        }
        let flags = blob[3];
        let little_endian = flags & 0b1 == 1;
        let envelope_len = match (flags >> 1) & 0b111 {
            0 => 0,
            1 => 32,
            2 | 3 => 48,
            4 => 64,
            other => return Err(format!("invalid envelope indicator {}", other)),
        };
        let srs_bytes = [blob[4], blob[5], blob[6], blob[7]];
        let srs_id = if little_endian {
            i32::from_le_bytes(srs_bytes)
        } else {
            i32::from_be_bytes(srs_bytes)
        };
        let wkb_start = 8 + envelope_len;
        if blob.len() < wkb_start {
            return Err(format!(
                "blob of {} bytes is shorter than its {}-byte header",
                blob.len(),
                wkb_start
            ));
        }
        Ok(Self {
            srs_id,
            wkb: blob[wkb_start..].to_vec(),
        })
    }
}

/// Attribute columns of one label file, one entry per region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelRecords {
    pub indices: Vec<f64>,
    pub populations: Vec<f64>,
    pub geometries: Vec<Option<Geometry>>,
}

impl LabelRecords {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Source of label records.
///
/// Implementations must release any file handle before returning.
pub trait VectorBackend {
    fn read(&self, path: &Path) -> DatasetResult<LabelRecords>;
}

/// Reads the first feature table of a GeoPackage
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoPackageReader;

impl VectorBackend for GeoPackageReader {
    fn read(&self, path: &Path) -> DatasetResult<LabelRecords> {
        let sql_err = |source: rusqlite::Error| DatasetError::Vector {
            path: path.to_path_buf(),
            source,
        };

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(sql_err)?;
        let records = read_features(&conn, path).map_err(|e| match e {
            ReadFailure::Sql(source) => sql_err(source),
            ReadFailure::Malformed(reason) => DatasetError::malformed(path, reason),
        })?;
        conn.close().map_err(|(_, source)| sql_err(source))?;

        if records.is_empty() {
            return Err(DatasetError::malformed(path, "feature table has no rows"));
        }
        debug!("Read {} label records from {:?}", records.len(), path);
        Ok(records)
    }
}

enum ReadFailure {
    Sql(rusqlite::Error),
    Malformed(String),
}

impl From<rusqlite::Error> for ReadFailure {
    fn from(error: rusqlite::Error) -> Self {
        ReadFailure::Sql(error)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn table_exists(conn: &Connection, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get::<_, i64>(0),
    )
    .map(|count| count > 0)
}

fn read_features(conn: &Connection, path: &Path) -> Result<LabelRecords, ReadFailure> {
    for required in ["gpkg_contents", "gpkg_geometry_columns"] {
        if !table_exists(conn, required)? {
            return Err(ReadFailure::Malformed(format!("missing table {}", required)));
        }
    }

    let table: String = conn
        .query_row(
            "SELECT table_name FROM gpkg_contents WHERE data_type = 'features' \
             ORDER BY table_name LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| ReadFailure::Malformed("no feature table".to_string()))?;

    let geometry_column: String = conn
        .query_row(
            "SELECT column_name FROM gpkg_geometry_columns WHERE table_name = ?1",
            [&table],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| {
            ReadFailure::Malformed(format!("no geometry column registered for {}", table))
        })?;

    let columns: Vec<String> = {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
        let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
        names.collect::<rusqlite::Result<_>>()?
    };
    for required in [INDEX_COLUMN, POPULATION_COLUMN, geometry_column.as_str()] {
        if !columns.iter().any(|c| c == required) {
            return Err(ReadFailure::Malformed(format!(
                "table {} has no column {}",
                table, required
            )));
        }
    }

    let sql = format!(
        "SELECT {}, {}, {} FROM {}",
        quote_ident(INDEX_COLUMN),
        quote_ident(POPULATION_COLUMN),
        quote_ident(&geometry_column),
        quote_ident(&table)
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    let mut records = LabelRecords::default();
    while let Some(row) = rows.next()? {
        let index: Option<f64> = row.get(0)?;
        let population: Option<f64> = row.get(1)?;
        let blob: Option<Vec<u8>> = row.get(2)?;

        let index = index.ok_or_else(|| ReadFailure::Malformed("NULL Index value".to_string()))?;
        let population = population
            .filter(|p| p.is_finite())
            .ok_or_else(|| {
                ReadFailure::Malformed("NULL or non-finite Population value".to_string())
            })?;
        let geometry = blob
            .map(|b| Geometry::from_gpkg_blob(&b))
            .transpose()
            .map_err(|reason| {
                ReadFailure::Malformed(format!("{} in {:?}", reason, path.file_name()))
            })?;

        records.indices.push(index);
        records.populations.push(population);
        records.geometries.push(geometry);
    }
    Ok(records)
}
