use log::debug;
use polars::prelude::*;
use rusqlite::Connection;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub fn write_parquet(dir: &Path, name: &str, mut df: DataFrame) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();
    ParquetWriter::new(&mut file).finish(&mut df).unwrap();
    path
}

/// Two visits with the intermediate flux error naming, an unreadable visit and
/// a file outside the filename pattern.
pub fn write_visits(dir: &Path) {
    write_parquet(
        dir,
        "source_visit_100.parquet",
        df!(
            "ra" => [10.0f64, 11.0, 12.0],
            "dec" => [-30.0f64, -31.0, -32.0],
            "g_fluxErr" => [0.1f64, 0.2, 0.3],
            "psFlux_flag_bad" => [false, true, false]
        )
        .unwrap(),
    );
    write_parquet(
        dir,
        "source_visit_20.parquet",
        df!(
            "ra" => [20.0f64, 21.0],
            "dec" => [-40.0f64, -41.0],
            "g_fluxErr" => [0.4f64, 0.5],
            "psFlux_flag_bad" => [true, true]
        )
        .unwrap(),
    );
    fs::write(dir.join("source_visit_3.parquet"), b"not a parquet file").unwrap();
    write_parquet(
        dir,
        "object_1.parquet",
        df!("objectId" => [1i64, 2]).unwrap(),
    );
}

pub const TRUTH_ROWS: &str = "
CREATE TABLE truth (a INT, b DOUBLE, x BIGINT, y FLOAT, name TEXT, star BOOLEAN);
INSERT INTO truth VALUES (1, 1.5, 1, 1.0, 'one', 1);
INSERT INTO truth VALUES (2, 2.5, -1, 2.0, 'two', 0);
INSERT INTO truth VALUES (3, 3.5, 5, 7.5, 'three', 1);
INSERT INTO truth VALUES (4, NULL, 9, 4.0, NULL, 0);
";

pub const COLUMN_DESCRIPTIONS: &str = "
CREATE TABLE column_descriptions (name TEXT, description TEXT);
INSERT INTO column_descriptions VALUES ('a', 'Integer label');
INSERT INTO column_descriptions VALUES ('b', 'Measured brightness');
";

pub fn write_sqlite(dir: &Path, name: &str, statements: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let conn = Connection::open(&path).unwrap();
    for s in statements {
        conn.execute_batch(s).unwrap();
    }
    path
}

pub fn init_logger() {
    if env_logger::builder().is_test(true).try_init().is_err() {
        debug!("Tried to initialize logger which is already initialized")
    }
}
