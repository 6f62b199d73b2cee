use std::{
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    error::Result,
    sql::{schema::Table, types::Row},
    storage::{
        engine::RowStore,
        format::{decode_header, decode_row, encode_header, encode_row, render_metadata},
    },
};

const REGISTRY_FILE: &str = "databases.txt";
const DATA_EXT: &str = ".txt";
const METADATA_SUFFIX: &str = "_metadata.txt";

/// Flat-file row store
///
/// ```text
/// <base>/databases.txt            one database name per line
/// <base>/<db>/<table>.txt         header line, then one line per row
/// <base>/<db>/<table>_metadata.txt
/// ```
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `base`, creating the directory if needed
    pub fn new(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn database_dir(&self, database: &str) -> PathBuf {
        self.base.join(database)
    }

    fn data_file(&self, table: &Table) -> PathBuf {
        self.database_dir(&table.database)
            .join(format!("{}{}", table.name, DATA_EXT))
    }

    fn metadata_file(&self, table: &Table) -> PathBuf {
        self.database_dir(&table.database)
            .join(format!("{}{}", table.name, METADATA_SUFFIX))
    }

    fn write_file(&self, table: &Table, rows: &[Row]) -> Result<()> {
        let mut content = encode_header(table);
        content.push('\n');
        for row in rows {
            content.push_str(&encode_row(table, row));
            content.push('\n');
        }
        fs::write(self.data_file(table), content)?;
        Ok(())
    }
}

impl RowStore for FileStore {
    fn load_databases(&self) -> Result<Vec<String>> {
        let path = self.base.join(REGISTRY_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn create_database(&mut self, name: &str) -> Result<()> {
        fs::create_dir_all(self.database_dir(name))?;
        let mut registry = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base.join(REGISTRY_FILE))?;
        writeln!(registry, "{}", name)?;
        Ok(())
    }

    fn load_tables(&self, database: &str) -> Result<Vec<Table>> {
        let dir = self.database_dir(database);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let file_name = entry?.file_name().to_string_lossy().to_string();
            if file_name.ends_with(METADATA_SUFFIX) {
                continue;
            }
            if let Some(name) = file_name.strip_suffix(DATA_EXT) {
                names.push(name.to_string());
            }
        }
        names.sort();

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let path = self.database_dir(database).join(format!("{}{}", name, DATA_EXT));
            let mut header = String::new();
            BufReader::new(fs::File::open(path)?).read_line(&mut header)?;
            tables.push(decode_header(database, &name, header.trim_end_matches(['\r', '\n']))?);
        }
        debug!("loaded {} table(s) of database {}", tables.len(), database);
        Ok(tables)
    }

    fn create_table(&mut self, table: &Table) -> Result<()> {
        fs::create_dir_all(self.database_dir(&table.database))?;
        self.write_file(table, &[])?;
        fs::write(self.metadata_file(table), render_metadata(table))?;
        Ok(())
    }

    fn drop_table(&mut self, table: &Table) -> Result<bool> {
        let mut dropped = true;
        for path in [self.data_file(table), self.metadata_file(table)] {
            if let Err(err) = fs::remove_file(&path) {
                warn!("failed to remove {}: {}", path.display(), err);
                dropped = false;
            }
        }
        Ok(dropped)
    }

    fn read_rows(&self, table: &Table) -> Result<Vec<Row>> {
        let reader = BufReader::new(fs::File::open(self.data_file(table))?);
        let mut rows = Vec::new();
        for line in reader.lines().skip(1) {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            rows.push(decode_row(table, &line)?);
        }
        Ok(rows)
    }

    fn append_row(&mut self, table: &Table, row: &Row) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(self.data_file(table))?;
        writeln!(file, "{}", encode_row(table, row))?;
        Ok(())
    }

    fn write_rows(&mut self, table: &Table, rows: &[Row]) -> Result<()> {
        self.write_file(table, rows)
    }
}
