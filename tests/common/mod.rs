//! Fixture builders shared by the integration tests: real TIFF images and
//! GeoPackage label files laid out under a temporary storage root.
#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use satpop::{DatasetConfig, DatasetSplit, SplitLayout, StorageProfile, StorageRoots};
use tiff::encoder::{colortype, TiffEncoder};

/// Pixel value written at (channel, row, col) of sample `index`
pub fn pixel(index: u32, c: u32, y: u32, x: u32) -> u8 {
    ((index * 31 + c * 7 + y * 3 + x) % 251) as u8
}

pub fn write_rgb_tiff(path: &Path, index: u32, height: u32, width: u32) {
    let mut data = Vec::with_capacity((height * width * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                data.push(pixel(index, c, y, x));
            }
        }
    }
    let mut encoder = TiffEncoder::new(File::create(path).unwrap()).unwrap();
    encoder
        .write_image::<colortype::RGB8>(width, height, &data)
        .unwrap();
}

/// Little-endian GeoPackage blob (no envelope) around a WKB point
pub fn point_blob(x: f64, y: f64) -> Vec<u8> {
    let mut blob = vec![b'G', b'P', 0, 0b0000_0001];
    blob.extend_from_slice(&4326i32.to_le_bytes());
    blob.push(1);
    blob.extend_from_slice(&1u32.to_le_bytes());
    blob.extend_from_slice(&x.to_le_bytes());
    blob.extend_from_slice(&y.to_le_bytes());
    blob
}

pub fn write_gpkg(path: &Path, rows: &[(i64, f64)], population_column: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE gpkg_contents (
            table_name TEXT NOT NULL PRIMARY KEY,
            data_type TEXT NOT NULL,
            identifier TEXT,
            srs_id INTEGER
        );
        CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL,
            column_name TEXT NOT NULL,
            geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL,
            z TINYINT NOT NULL,
            m TINYINT NOT NULL
        );
        CREATE TABLE regions (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            geom BLOB,
            \"Index\" INTEGER,
            \"{population_column}\" REAL
        );
        INSERT INTO gpkg_contents (table_name, data_type, srs_id) VALUES ('regions', 'features', 4326);
        INSERT INTO gpkg_geometry_columns VALUES ('regions', 'geom', 'POINT', 4326, 0, 0);"
    ))
    .unwrap();
    for (index, population) in rows {
        conn.execute(
            &format!(
                "INSERT INTO regions (geom, \"Index\", \"{population_column}\") VALUES (?1, ?2, ?3)"
            ),
            params![point_blob(*index as f64, 0.5), index, population],
        )
        .unwrap();
    }
}

pub struct Fixture {
    _dir: tempfile::TempDir,
    pub root: PathBuf,
}

impl Fixture {
    /// Samples as (index, height, width, population)
    pub fn new(split: DatasetSplit, samples: &[(u32, u32, u32, f64)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        let layout = SplitLayout::new(&root, split);
        fs::create_dir_all(&layout.images_dir).unwrap();
        fs::create_dir_all(&layout.labels_dir).unwrap();
        for &(index, h, w, population) in samples {
            let idx = index.to_string();
            write_rgb_tiff(&layout.image_path(&idx), index, h, w);
            write_gpkg(&layout.label_path(&idx), &[(index as i64, population)], "Population");
        }
        Self { _dir: dir, root }
    }

    pub fn layout(&self, split: DatasetSplit) -> SplitLayout {
        SplitLayout::new(&self.root, split)
    }

    pub fn config(&self, split: DatasetSplit, classes: u32) -> DatasetConfig {
        DatasetConfig {
            split,
            storage: StorageProfile::Local,
            roots: StorageRoots {
                local: self.root.clone(),
                colab: PathBuf::from("/unused"),
            },
            classes,
            ..Default::default()
        }
    }
}

pub fn standard_fixture() -> Fixture {
    Fixture::new(
        DatasetSplit::Train,
        &[
            (1, 60, 80, 0.0),
            (2, 40, 55, 150.0),
            (10, 20, 30, 20000.0),
        ],
    )
}
