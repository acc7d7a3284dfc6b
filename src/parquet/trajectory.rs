//! Save the threshold-aligned country series to a parquet file.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{anyhow, Result};
use arrow::{
    array::{Date32Builder, Int32Builder, Int64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use parquet::{
    arrow::ArrowWriter,
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};

use crate::series::CountrySummary;

/// Writes one row per country per day since the threshold. Returns the row count.
pub fn save_trajectories(summaries: &[CountrySummary], file_path: &Path) -> Result<usize> {
    let num_rows: usize = summaries
        .iter()
        .filter_map(|s| s.trajectory.as_ref())
        .map(|t| t.len())
        .sum();

    let schema = Arc::new(Schema::new(vec![
        Field::new("geo_id", DataType::Utf8, false),
        Field::new("day", DataType::Int32, false),
        Field::new("date", DataType::Date32, false),
        Field::new("new_cases", DataType::Int64, false),
        Field::new("cumulative_cases", DataType::Int64, false),
    ]));

    let mut geo_id_builder = StringBuilder::with_capacity(num_rows, num_rows * 2);
    let mut day_builder = Int32Builder::with_capacity(num_rows);
    let mut date_builder = Date32Builder::with_capacity(num_rows);
    let mut new_cases_builder = Int64Builder::with_capacity(num_rows);
    let mut cumulative_builder = Int64Builder::with_capacity(num_rows);

    let epoch_offset = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| anyhow!("invalid epoch"))?
        .num_days_from_ce();

    for summary in summaries {
        let Some(trajectory) = &summary.trajectory else {
            continue;
        };
        for (day, date) in trajectory.dates.iter().enumerate() {
            geo_id_builder.append_value(&summary.geo_id);
            day_builder.append_value(day as i32);
            date_builder.append_value(date.num_days_from_ce() - epoch_offset);
            new_cases_builder.append_value(trajectory.new_cases[day]);
            cumulative_builder.append_value(trajectory.cumulative[day]);
        }
    }

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(geo_id_builder.finish()),
            Arc::new(day_builder.finish()),
            Arc::new(date_builder.finish()),
            Arc::new(new_cases_builder.finish()),
            Arc::new(cumulative_builder.finish()),
        ],
    )?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .set_dictionary_enabled(true)
        .build();

    let file = File::create(file_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(num_rows)
}

// -- Tests -------------------------------------------------------------------
