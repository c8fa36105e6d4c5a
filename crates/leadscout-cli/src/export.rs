use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use crate::record::{PlaceRecord, NOT_AVAILABLE};

const CSV_HEADERS: [&str; 6] = ["name", "address", "phone", "email", "website", "hours"];

pub fn export_csv<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a PlaceRecord>,
{
    let file =
        File::create(path).with_context(|| format!("Couldn't create {}", path.display()))?;
    write_records(BufWriter::new(file), records)
}

pub fn write_records<'a, W, I>(out: W, records: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = &'a PlaceRecord>,
{
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_HEADERS)?;
    for record in records {
        let email = record.joined_emails();
        wtr.write_record([
            field(&record.name),
            field(&record.address),
            field(&record.phone),
            email.as_str(),
            field(&record.website),
            field(&record.hours),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}
