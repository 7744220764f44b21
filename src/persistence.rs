//! Reads and writes the four data files
//! Products and teachers are CSV tables, orders and students are JSON lists

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, Trim};
use log::*;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::DataConfig,
    entities::{Order, Product, Student, Teacher},
    error::StoreError,
    records::{OrderRecord, ProductRecord, StudentRecord, TeacherRecord},
};

/// Where the records live between runs
pub trait Persistence {
    fn load_products(&self) -> Result<Vec<Product>, StoreError>;
    /// Orders are returned raw, the store resolves them against the products
    fn load_orders(&self) -> Result<Vec<OrderRecord>, StoreError>;
    fn load_students(&self) -> Result<Vec<Student>, StoreError>;
    fn load_teachers(&self) -> Result<Vec<Teacher>, StoreError>;

    fn save_products(&self, products: &[Product]) -> Result<(), StoreError>;
    fn save_orders(&self, orders: &[Order]) -> Result<(), StoreError>;
    fn save_students(&self, students: &[Student]) -> Result<(), StoreError>;
    fn save_teachers(&self, teachers: &[Teacher]) -> Result<(), StoreError>;
}

/// Keeps the records in plain files inside a data directory
pub struct FilePersistence {
    products: PathBuf,
    orders: PathBuf,
    students: PathBuf,
    teachers: PathBuf,
}

impl FilePersistence {
    pub fn new(data: &DataConfig) -> Self {
        let dir = Path::new(&data.dir);
        Self {
            products: dir.join(&data.products_file),
            orders: dir.join(&data.orders_file),
            students: dir.join(&data.students_file),
            teachers: dir.join(&data.teachers_file),
        }
    }
}

impl Persistence for FilePersistence {
    fn load_products(&self) -> Result<Vec<Product>, StoreError> {
        let records: Vec<ProductRecord> = read_csv(&self.products)?;
        Ok(records.into_iter().map(Product::from).collect())
    }

    fn load_orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        read_json(&self.orders)
    }

    fn load_students(&self) -> Result<Vec<Student>, StoreError> {
        let records: Vec<StudentRecord> = read_json(&self.students)?;
        Ok(records.into_iter().map(Student::from).collect())
    }

    fn load_teachers(&self) -> Result<Vec<Teacher>, StoreError> {
        let records: Vec<TeacherRecord> = read_csv(&self.teachers)?;
        Ok(records.into_iter().map(Teacher::from).collect())
    }

    fn save_products(&self, products: &[Product]) -> Result<(), StoreError> {
        write_csv(&self.products, products.iter().map(ProductRecord::from))
    }

    fn save_orders(&self, orders: &[Order]) -> Result<(), StoreError> {
        let records: Vec<OrderRecord> = orders.iter().map(OrderRecord::from).collect();
        write_json(&self.orders, &records)
    }

    fn save_students(&self, students: &[Student]) -> Result<(), StoreError> {
        let records: Vec<StudentRecord> = students.iter().map(StudentRecord::from).collect();
        write_json(&self.students, &records)
    }

    fn save_teachers(&self, teachers: &[Teacher]) -> Result<(), StoreError> {
        write_csv(&self.teachers, teachers.iter().map(TeacherRecord::from))
    }
}

/// Opens `path` for reading. A missing file is not an error, there is just
/// nothing to load yet
fn open(path: &Path) -> Result<Option<File>, StoreError> {
    match File::open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, starting empty", path.display());
            Ok(None)
        }
        Err(err) => Err(StoreError::persistence(path, err)),
    }
}

/// Read all the rows of a CSV file with a header
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = match open(path)? {
        Some(file) => file,
        None => return Ok(Vec::new()),
    };

    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let mut rows = Vec::new();
    for row in csv_reader.deserialize::<T>() {
        rows.push(row.map_err(|err| StoreError::persistence(path, err))?);
    }

    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a JSON list
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let file = match open(path)? {
        Some(file) => file,
        None => return Ok(Vec::new()),
    };

    let entries: Vec<T> = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| StoreError::persistence(path, err))?;

    info!("Read {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Replaces the file with one row per record, header included
pub fn write_csv<T: Serialize>(
    path: &Path,
    records: impl IntoIterator<Item = T>,
) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| StoreError::persistence(path, err))?;

    let mut count = 0;
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| StoreError::persistence(path, err))?;
        count += 1;
    }
    writer
        .flush()
        .map_err(|err| StoreError::persistence(path, err))?;

    info!("Saved {} rows to {}", count, path.display());
    Ok(())
}

/// Replaces the file with a pretty printed JSON list
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|err| StoreError::persistence(path, err))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, records)
        .map_err(|err| StoreError::persistence(path, err))?;
    writer
        .flush()
        .map_err(|err| StoreError::persistence(path, err))?;

    info!("Saved {} entries to {}", records.len(), path.display());
    Ok(())
}

/// Keeps nothing, only remembers which collections were saved.
/// Every write fails when `fail_writes` is set
#[cfg(test)]
#[derive(Default)]
pub struct MemoryPersistence {
    pub saved: std::cell::RefCell<Vec<&'static str>>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl MemoryPersistence {
    fn write(&self, what: &'static str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Persistence {
                path: what.to_string(),
                reason: "disk full".to_string(),
            });
        }
        self.saved.borrow_mut().push(what);
        Ok(())
    }
}

#[cfg(test)]
impl Persistence for MemoryPersistence {
    fn load_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(Vec::new())
    }
    fn load_orders(&self) -> Result<Vec<OrderRecord>, StoreError> {
        Ok(Vec::new())
    }
    fn load_students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(Vec::new())
    }
    fn load_teachers(&self) -> Result<Vec<Teacher>, StoreError> {
        Ok(Vec::new())
    }
    fn save_products(&self, _: &[Product]) -> Result<(), StoreError> {
        self.write("products")
    }
    fn save_orders(&self, _: &[Order]) -> Result<(), StoreError> {
        self.write("orders")
    }
    fn save_students(&self, _: &[Student]) -> Result<(), StoreError> {
        self.write("students")
    }
    fn save_teachers(&self, _: &[Teacher]) -> Result<(), StoreError> {
        self.write("teachers")
    }
}
