use crate::utils::{read_guide_sequence, Result, Workspace};
use itertools::Itertools;
use std::{fmt, path::PathBuf, str::FromStr};

/// Clusters below this relative frequency are treated as artifacts.
pub const MIN_CLUSTER_FREQUENCY: f64 = 0.05;
/// Clusters supported by this many reads carry no signal and are dropped.
pub const SINGLETON_READ_COUNT: u64 = 1;
/// `uchime_score` value pbaa writes for clusters it did not flag as chimeric.
pub const CHIMERA_SENTINEL: &str = "-1";

pub const PBAA_DEFAULTS: &[&str] = &["--max-reads-per-guide=1000000", "--max-uchime-score=0.01"];

pub const SLURM_DEFAULTS: &[&str] = &[
    "--qos=normal",
    "--nodes=1",
    "--time=01:00:00",
    "--mem-per-cpu=4G",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gene {
    Adrb1,
    Adrb2,
}

struct GenePreset {
    snps: (usize, usize),
    haplotypes: &'static [&'static str],
    guide: &'static str,
    pbaa_options: &'static [&'static str],
}

impl Gene {
    pub const ALL: [Gene; 2] = [Gene::Adrb1, Gene::Adrb2];

    pub fn name(&self) -> &'static str {
        match self {
            Gene::Adrb1 => "adrb1",
            Gene::Adrb2 => "adrb2",
        }
    }

    fn preset(&self) -> GenePreset {
        match self {
            Gene::Adrb1 => GenePreset {
                snps: (145, 1165),
                haplotypes: &["ag", "ac", "gc", "gg"],
                guide: "adrb1.fa",
                pbaa_options: &[],
            },
            Gene::Adrb2 => GenePreset {
                snps: (46, 79),
                haplotypes: &["gg", "ag", "gc", "ac"],
                guide: "adrb2.fa",
                pbaa_options: &[],
            },
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Gene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_lowercase();
        Gene::ALL
            .into_iter()
            .find(|gene| gene.name() == lowered)
            .ok_or_else(|| {
                format!(
                    "Invalid gene '{}' specified. Valid options are: {}",
                    lowered,
                    Gene::ALL.iter().map(|g| g.name()).join(", ")
                )
            })
    }
}

/// Immutable per-run gene configuration. Built once at startup and shared by
/// reference with every stage.
#[derive(Debug, Clone)]
pub struct GeneConfig {
    name: String,
    snps: (usize, usize),
    haplotypes: Vec<String>,
    guide_path: PathBuf,
    reference: String,
    pbaa_options: Vec<String>,
}

impl GeneConfig {
    /// Resolves the gene's guide under `guides/`, loads its sequence and
    /// validates the preset against it.
    pub fn load(gene: Gene, workspace: &Workspace) -> Result<Self> {
        let preset = gene.preset();
        let guide_path = workspace.guides_dir().join(preset.guide);
        if !guide_path.is_file() {
            return Err(format!(
                "Guide file {} not found under {}.",
                preset.guide,
                workspace.guides_dir().display()
            ));
        }
        let reference = read_guide_sequence(&guide_path)?;
        let mut config = Self::new(
            gene.name(),
            preset.snps,
            preset.haplotypes.iter().map(|h| h.to_string()).collect(),
            reference,
        )?
        .with_guide_path(guide_path);
        config.pbaa_options = preset.pbaa_options.iter().map(|o| o.to_string()).collect();
        Ok(config)
    }

    pub fn new(
        name: &str,
        snps: (usize, usize),
        haplotypes: Vec<String>,
        reference: String,
    ) -> Result<Self> {
        let reference = reference.to_uppercase();
        for pos in [snps.0, snps.1] {
            if pos == 0 || pos > reference.len() {
                return Err(format!(
                    "{}: SNP position {} is outside the reference (1..={})",
                    name,
                    pos,
                    reference.len()
                ));
            }
        }
        let haplotypes: Vec<String> = haplotypes.into_iter().map(|h| h.to_lowercase()).collect();
        if haplotypes.is_empty() {
            return Err(format!("{}: no haplotypes configured", name));
        }
        for haplotype in &haplotypes {
            if haplotype.len() != 2 || !haplotype.bytes().all(|b| b"acgt".contains(&b)) {
                return Err(format!(
                    "{}: invalid haplotype '{}', expected two bases from a, c, g, t",
                    name, haplotype
                ));
            }
        }
        if haplotypes.iter().duplicates().next().is_some() {
            return Err(format!("{}: duplicate haplotypes configured", name));
        }
        Ok(Self {
            name: name.to_string(),
            snps,
            haplotypes,
            guide_path: PathBuf::new(),
            reference,
            pbaa_options: Vec::new(),
        })
    }

    pub fn with_guide_path(mut self, guide_path: impl Into<PathBuf>) -> Self {
        self.guide_path = guide_path.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based SNP positions on the reference.
    pub fn snps(&self) -> (usize, usize) {
        self.snps
    }

    pub fn haplotypes(&self) -> &[String] {
        &self.haplotypes
    }

    pub fn haplotype_index(&self, code: &str) -> Option<usize> {
        self.haplotypes.iter().position(|h| h == code)
    }

    pub fn guide_path(&self) -> &PathBuf {
        &self.guide_path
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn pbaa_options(&self) -> &[String] {
        &self.pbaa_options
    }
}
