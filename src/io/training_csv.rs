//! Training sample CSV read/write.
//!
//! The header is the `TrainingSample` field list:
//! `category,location,area_sqm,complexity_score,material_quality_score,price`.

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::domain::TrainingSample;
use crate::error::PricingError;

/// Write samples to a CSV file, replacing it if it exists.
pub fn write_training_csv(path: &Path, samples: &[TrainingSample]) -> Result<(), PricingError> {
    let file = File::create(path).map_err(|source| PricingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_samples(file, samples).map_err(|source| PricingError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = samples.len(), "wrote training csv");
    Ok(())
}

/// Read every sample from a CSV file. Any malformed row fails the whole read.
pub fn read_training_csv(path: &Path) -> Result<Vec<TrainingSample>, PricingError> {
    let file = File::open(path).map_err(|source| PricingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let samples = read_samples(file).map_err(|source| PricingError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = samples.len(), "read training csv");
    Ok(samples)
}

pub fn write_samples<W: std::io::Write>(writer: W, samples: &[TrainingSample]) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for sample in samples {
        wtr.serialize(sample)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn read_samples<R: std::io::Read>(reader: R) -> Result<Vec<TrainingSample>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    rdr.deserialize().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_the_documented_header() {
        let samples = vec![TrainingSample {
            category: "Foundation Work".to_string(),
            location: "Nuwara Eliya".to_string(),
            area_sqm: 42.5,
            complexity_score: 6.1,
            material_quality_score: 7.0,
            price: 8123.0,
        }];
        let mut buf = Vec::new();
        write_samples(&mut buf, &samples).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("category,location,area_sqm,complexity_score,material_quality_score,price")
        );
        assert!(lines.next().unwrap().starts_with("Foundation Work,Nuwara Eliya,42.5,"));
        assert_eq!(read_samples(text.as_bytes()).unwrap(), samples);
    }

    #[test]
    fn reads_padded_fields() {
        let text = "category, location, area_sqm, complexity_score, material_quality_score, price\n\
                    Plumbing, Galle, 20, 4.5, 5, 4500\n";
        let samples = read_samples(text.as_bytes()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].location, "Galle");
        assert_eq!(samples[0].price, 4500.0);
    }

    #[test]
    fn malformed_row_is_a_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "category,location,area_sqm,complexity_score,material_quality_score,price\nPainting,Kandy,lots,5,5,100\n",
        )
        .unwrap();
        assert!(matches!(read_training_csv(&path), Err(PricingError::Csv { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_training_csv(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, PricingError::Io { .. }));
    }
}
