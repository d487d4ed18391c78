use crate::utils::{
    open_fasta_reader, record_header, Result, Workspace, CHIMERA_SENTINEL, SINGLETON_READ_COUNT,
};
use bio::io::fasta;
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Read as ioRead},
    path::Path,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRecord {
    pub id: String,
    pub seq: String,
    pub read_count: u64,
    pub frequency: f64,
    /// Parsed and carried, but not used for filtering.
    pub possibly_chimeric: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterHeader {
    pub id: String,
    pub read_count: u64,
    pub frequency: f64,
    pub possibly_chimeric: bool,
}

/// Decodes a pbaa cluster header such as
/// `s1_guide_cluster-0_ReadCount-350 uchime_score:-1 cluster_freq:0.92`.
pub fn parse_cluster_header(header: &str) -> Result<ClusterHeader> {
    let mut tokens = header.split_whitespace();
    let label = tokens
        .next()
        .ok_or_else(|| format!("Malformed cluster header (empty): '{}'", header))?;
    let fields = decode_fields(tokens);

    let missing = |name: &str| format!("Malformed cluster header (missing {}): '{}'", name, header);
    let invalid = |name: &str| format!("Malformed cluster header (invalid {}): '{}'", name, header);

    let id = label
        .split('_')
        .rev()
        .find_map(|part| part.strip_prefix("cluster-"))
        .ok_or_else(|| missing("cluster id"))?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("cluster id"));
    }

    let read_count = label
        .split('_')
        .rev()
        .find_map(|part| part.strip_prefix("ReadCount-"))
        .ok_or_else(|| missing("ReadCount"))?
        .parse::<u64>()
        .map_err(|_| invalid("ReadCount"))?;

    let frequency = fields
        .get("cluster_freq")
        .ok_or_else(|| missing("cluster_freq"))?
        .parse::<f64>()
        .map_err(|_| invalid("cluster_freq"))?;
    if !(0.0..=1.0).contains(&frequency) {
        return Err(invalid("cluster_freq"));
    }

    // Prefix match, so `-1.5` also reads as unscored.
    let possibly_chimeric = fields
        .get("uchime_score")
        .map_or(true, |score| !score.starts_with(CHIMERA_SENTINEL));

    Ok(ClusterHeader {
        id: id.to_string(),
        read_count,
        frequency,
        possibly_chimeric,
    })
}

fn decode_fields<'a>(tokens: impl Iterator<Item = &'a str>) -> HashMap<&'a str, &'a str> {
    tokens.filter_map(|token| token.split_once(':')).collect()
}

/// Lazily decodes cluster records from one pbaa output file, dropping
/// singleton clusters.
pub struct ClusterRecords<R: BufRead> {
    records: fasta::Records<R>,
    source: String,
}

impl<R: BufRead> ClusterRecords<R> {
    pub fn new(reader: R, source: &str) -> Self {
        Self {
            records: fasta::Reader::from_bufread(reader).records(),
            source: source.to_string(),
        }
    }
}

impl<R: BufRead> Iterator for ClusterRecords<R> {
    type Item = Result<ClusterRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(format!("{}: {}", self.source, e))),
            };
            let header = match parse_cluster_header(&record_header(&record)) {
                Ok(header) => header,
                Err(e) => return Some(Err(format!("{}: {}", self.source, e))),
            };
            if header.read_count <= SINGLETON_READ_COUNT {
                continue;
            }
            return Some(Ok(ClusterRecord {
                id: header.id,
                seq: String::from_utf8_lossy(record.seq()).into_owned(),
                read_count: header.read_count,
                frequency: header.frequency,
                possibly_chimeric: header.possibly_chimeric,
            }));
        }
    }
}

pub fn read_cluster_file(path: &Path) -> Result<ClusterRecords<BufReader<Box<dyn ioRead>>>> {
    let reader = open_fasta_reader(path)?;
    Ok(ClusterRecords::new(reader, &path.to_string_lossy()))
}

/// Streams a sample's clusters from the passed file, then the failed file.
/// Every call reopens both files.
pub fn read_clusters(
    workspace: &Workspace,
    sample: &str,
) -> Result<impl Iterator<Item = Result<ClusterRecord>>> {
    let passed = read_cluster_file(&workspace.passed_clusters_path(sample))?;
    let failed = read_cluster_file(&workspace.failed_clusters_path(sample))?;
    Ok(passed.chain(failed))
}
