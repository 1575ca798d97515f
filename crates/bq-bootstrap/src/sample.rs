use std::io;
use std::path::Path;

use crate::error::LoadError;

/// Header and rows of the sample source: a 'name' column with two rows.
const SAMPLE_ROWS: [&str; 3] = ["name", "foo", "bar"];

/// Writes the sample CSV to 'writer'.
pub fn write_sample<W: io::Write>(writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    for row in SAMPLE_ROWS {
        writer.write_record([row])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the sample CSV to 'path', replacing anything already there.
pub fn write_sample_file(path: &Path) -> Result<(), LoadError> {
    let to_error = |source| LoadError::Sample {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::create(path).map_err(|error| to_error(csv::Error::from(error)))?;
    write_sample(file).map_err(to_error)?;

    info!(message = "wrote sample source", path = %path.display(), rows = SAMPLE_ROWS.len() - 1);
    Ok(())
}
