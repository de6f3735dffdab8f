// src/export.rs
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use parquet::{
    arrow::ArrowWriter,
    basic::{BrotliLevel, Compression},
    file::properties::WriterProperties,
};
use std::{
    fs::{self, File},
    path::Path,
};
use tracing::{info, instrument};

use crate::error::Result;

/// Write one batch as a Brotli-compressed Parquet file; returns bytes on disk.
#[instrument(level = "info", skip(batch), fields(rows = batch.num_rows(), path = %output_path.display()))]
pub fn write_parquet(batch: &RecordBatch, output_path: &Path) -> Result<u64> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(output_path)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::BROTLI(BrotliLevel::try_new(5)?))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    let bytes = fs::metadata(output_path)?.len();
    info!(bytes, "wrote parquet");
    Ok(bytes)
}

/// Write one batch as comma-separated text with a header row. Nulls become
/// empty cells.
#[instrument(level = "info", skip(batch), fields(rows = batch.num_rows(), path = %output_path.display()))]
pub fn write_csv(batch: &RecordBatch, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(output_path)?;
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    info!("wrote csv");
    Ok(())
}
