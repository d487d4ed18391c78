use super::Result;
use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

pub fn open_fasta_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

pub fn open_fasta_records(
    path: &Path,
) -> Result<fasta::Records<BufReader<Box<dyn ioRead>>>> {
    let reader = open_fasta_reader(path)?;
    Ok(fasta::Reader::from_bufread(reader).records())
}

/// Rebuilds the full header line (without `>`) from a parsed record.
pub fn record_header(record: &fasta::Record) -> String {
    match record.desc() {
        Some(desc) => format!("{} {}", record.id(), desc),
        None => record.id().to_string(),
    }
}

/// Loads the first sequence of a guide FASTA, uppercased.
pub fn read_guide_sequence(path: &Path) -> Result<String> {
    let record = open_fasta_records(path)?
        .next()
        .ok_or_else(|| format!("Guide file {} contains no sequences", path.display()))?
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    if record.seq().is_empty() {
        return Err(format!("Guide file {} has an empty sequence", path.display()));
    }
    Ok(String::from_utf8_lossy(record.seq()).to_uppercase())
}
