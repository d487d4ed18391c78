use crate::utils::Result;
use bio::{alphabets::dna::revcomp, io::fastq};
use rust_htslib::bam::{self, Read};
use std::{
    collections::HashSet,
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

const MAX_PHRED: u8 = 93;
const PHRED_OFFSET: u8 = 33;

pub fn get_bam_header(bam_path: &Path) -> Result<bam::Header> {
    let bam = bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader: {}", e))?;
    Ok(bam::Header::from_template(bam.header()))
}

pub fn get_sample_name(reads_path: &Path, bam_header: &bam::Header) -> Result<String> {
    let header_hashmap = bam_header.to_hashmap();
    let mut sample_names = HashSet::new();

    if let Some(rg_fields) = header_hashmap.get("RG") {
        for rg_field in rg_fields {
            if let Some(sample_name) = rg_field.get("SM") {
                sample_names.insert(sample_name.to_owned());
            }
        }
    }

    match sample_names.len() {
        1 => return Ok(sample_names.into_iter().next().unwrap()),
        0 => log::warn!("No sample names found"),
        _ => log::warn!("Multiple sample names found"),
    };

    let sample = reads_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or("Invalid reads file name")?
        .to_string();

    Ok(sample)
}

/// Writes single-line FASTQ records together with a samtools-compatible
/// FASTQ index (`.fai`), so no separate indexing pass is needed.
pub struct FastqWriter<W: Write, I: Write> {
    fastq: fastq::Writer<W>,
    index: I,
    offset: u64,
    num_records: usize,
}

impl FastqWriter<File, BufWriter<File>> {
    pub fn from_paths(fastq_path: &Path, index_path: &Path) -> Result<Self> {
        let create = |path: &Path| {
            File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))
        };
        Ok(Self::new(
            create(fastq_path)?,
            BufWriter::new(create(index_path)?),
        ))
    }
}

impl<W: Write, I: Write> FastqWriter<W, I> {
    pub fn new(fastq: W, index: I) -> Self {
        Self {
            fastq: fastq::Writer::new(fastq),
            index,
            offset: 0,
            num_records: 0,
        }
    }

    pub fn write(&mut self, name: &[u8], seq: &[u8], qual: &[u8]) -> Result<()> {
        let name = std::str::from_utf8(name)
            .map_err(|_| format!("Read name is not UTF-8: {}", String::from_utf8_lossy(name)))?;
        if seq.len() != qual.len() {
            return Err(format!(
                "Read {} has {} bases but {} quality values",
                name,
                seq.len(),
                qual.len()
            ));
        }
        let len = seq.len() as u64;
        let seq_offset = self.offset + name.len() as u64 + 2;
        let qual_offset = seq_offset + len + 3;

        self.fastq
            .write(name, None, seq, qual)
            .map_err(|e| format!("Failed to write FASTQ record: {}", e))?;
        writeln!(
            self.index,
            "{}\t{}\t{}\t{}\t{}\t{}",
            name,
            len,
            seq_offset,
            len,
            len + 1,
            qual_offset
        )
        .map_err(|e| format!("Failed to write FASTQ index: {}", e))?;

        self.offset = qual_offset + len + 1;
        self.num_records += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.fastq
            .flush()
            .and_then(|_| self.index.flush())
            .map_err(|e| format!("Failed to flush FASTQ output: {}", e))?;
        Ok(self.num_records)
    }
}

/// Converts every primary record of a BAM file into FASTQ, restoring the
/// original read orientation of reverse-strand alignments.
pub fn convert_bam_to_fastq(
    bam_path: &Path,
    fastq_path: &Path,
    index_path: &Path,
) -> Result<usize> {
    let mut reader = bam::Reader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader: {}", e))?;
    // The index only appears once the FASTQ is complete
    if index_path.exists() {
        fs::remove_file(index_path)
            .map_err(|e| format!("Failed to remove {}: {}", index_path.display(), e))?;
    }
    let tmp_index_path = index_path.with_extension("fai.tmp");
    let mut writer = FastqWriter::from_paths(fastq_path, &tmp_index_path)?;

    for (record_index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            format!(
                "Error reading record {} of {}: {}",
                record_index + 1,
                bam_path.display(),
                e
            )
        })?;
        if record.is_secondary() || record.is_supplementary() {
            continue;
        }

        let mut seq = record.seq().as_bytes();
        let mut qual = record
            .qual()
            .iter()
            .map(|&q| q.min(MAX_PHRED) + PHRED_OFFSET)
            .collect::<Vec<_>>();
        if record.is_reverse() {
            seq = revcomp(&seq);
            qual.reverse();
        }
        writer.write(record.qname(), &seq, &qual)?;
    }

    let num_records = writer.finish()?;
    fs::rename(&tmp_index_path, index_path).map_err(|e| {
        format!(
            "Failed to move {} to {}: {}",
            tmp_index_path.display(),
            index_path.display(),
            e
        )
    })?;
    Ok(num_records)
}
