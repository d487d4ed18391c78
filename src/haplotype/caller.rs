use crate::utils::{AlignScoring, GeneConfig};
use bio::alignment::{
    pairwise::{Aligner, MatchParams},
    Alignment, AlignmentOperation,
};
use bio::alphabets::dna::revcomp;

/// Base reported when a SNP position is not covered by the query.
const GAP: u8 = b'-';

/// Maps a cluster consensus sequence to a two-base haplotype code. The code
/// is not validated against the gene's haplotype set here.
pub trait CallHaplotype {
    fn call(&mut self, seq: &str) -> String;
}

pub fn reverse_complement(seq: &str) -> String {
    String::from_utf8_lossy(&revcomp(seq.as_bytes())).to_string()
}

pub struct HaplotypeCaller {
    reference: Vec<u8>,
    /// 0-based reference positions of the two SNPs.
    snps: (usize, usize),
    aligner: Aligner<MatchParams>,
}

impl HaplotypeCaller {
    pub fn new(gene: &GeneConfig, scoring: &AlignScoring) -> Self {
        let reference = gene.reference().as_bytes().to_ascii_uppercase();
        let (snp_1, snp_2) = gene.snps();
        let aligner = scoring.aligner(reference.len());
        Self {
            reference,
            snps: (snp_1 - 1, snp_2 - 1),
            aligner,
        }
    }

    /// Locally aligns the query and its reverse complement to the reference
    /// and keeps the higher scoring orientation; ties favor the forward strand.
    fn align_best_strand(&mut self, seq: &str) -> (Alignment, Vec<u8>) {
        let forward = seq.as_bytes().to_ascii_uppercase();
        let reverse = revcomp(&forward);
        let forward_aln = self.aligner.local(&self.reference, &forward);
        let reverse_aln = self.aligner.local(&self.reference, &reverse);
        log::trace!(
            "forward score {}, reverse score {}",
            forward_aln.score,
            reverse_aln.score
        );
        if forward_aln.score < reverse_aln.score {
            (reverse_aln, reverse)
        } else {
            (forward_aln, forward)
        }
    }
}

impl CallHaplotype for HaplotypeCaller {
    fn call(&mut self, seq: &str) -> String {
        let (alignment, query) = self.align_best_strand(seq);
        let snp_1 = query_base_at(&alignment, &query, self.snps.0);
        let snp_2 = query_base_at(&alignment, &query, self.snps.1);
        String::from_utf8_lossy(&[snp_1, snp_2]).to_ascii_lowercase()
    }
}

/// Returns the query base aligned to reference position `ref_pos`, or a gap
/// if the position lies outside the local alignment or is deleted in the
/// query. The reference is the `x` sequence of the alignment.
fn query_base_at(alignment: &Alignment, query: &[u8], ref_pos: usize) -> u8 {
    let (mut x, mut y) = (alignment.xstart, alignment.ystart);
    for op in &alignment.operations {
        match *op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                if x == ref_pos {
                    return query[y];
                }
                x += 1;
                y += 1;
            }
            AlignmentOperation::Ins => {
                if x == ref_pos {
                    return GAP;
                }
                x += 1;
            }
            AlignmentOperation::Del => y += 1,
            AlignmentOperation::Xclip(_) | AlignmentOperation::Yclip(_) => {}
        }
        if x > ref_pos {
            break;
        }
    }
    GAP
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_seq(rng: &mut StdRng, len: usize) -> String {
        (0..len)
            .map(|_| b"ACGT"[rng.random_range(0..4)] as char)
            .collect()
    }

    fn with_bases(seq: &str, edits: &[(usize, char)]) -> String {
        let mut bases: Vec<char> = seq.chars().collect();
        for &(pos, base) in edits {
            bases[pos - 1] = base;
        }
        bases.into_iter().collect()
    }

    fn gene(reference: &str, snps: (usize, usize)) -> GeneConfig {
        let haplotypes = ["a", "c", "g", "t"]
            .iter()
            .flat_map(|a| ["a", "c", "g", "t"].iter().map(move |b| format!("{}{}", a, b)))
            .collect();
        GeneConfig::new("test", snps, haplotypes, reference.to_string()).unwrap()
    }

    #[test]
    fn reverse_complement_of_dna() {
        assert_eq!(reverse_complement("AACGTT"), "AACGTT");
        assert_eq!(reverse_complement("ACCGTA"), "TACGGT");
    }

    #[test]
    fn injected_snps_are_read_back() {
        let mut rng = StdRng::seed_from_u64(42);
        let reference = random_seq(&mut rng, 200);
        let snps = (37, 151);
        let mut caller = HaplotypeCaller::new(&gene(&reference, snps), &AlignScoring::default());

        for (b1, b2) in [('C', 'T'), ('G', 'A'), ('a', 'g')] {
            let query = with_bases(&reference, &[(snps.0, b1), (snps.1, b2)]);
            let expected = format!("{}{}", b1, b2).to_lowercase();
            assert_eq!(caller.call(&query), expected);
        }
    }

    #[test]
    fn calling_is_strand_symmetric() {
        let mut rng = StdRng::seed_from_u64(7);
        let reference = random_seq(&mut rng, 300);
        let snps = (20, 280);
        let mut caller = HaplotypeCaller::new(&gene(&reference, snps), &AlignScoring::default());

        for _ in 0..10 {
            let b1 = b"ACGT"[rng.random_range(0..4)] as char;
            let b2 = b"ACGT"[rng.random_range(0..4)] as char;
            let query = with_bases(&reference, &[(snps.0, b1), (snps.1, b2)]);
            let forward = caller.call(&query);
            let reverse = caller.call(&reverse_complement(&query));
            assert_eq!(forward, reverse);
            assert_eq!(forward, format!("{}{}", b1, b2).to_lowercase());
        }
    }

    #[test]
    fn partial_query_with_flanking_noise() {
        let mut rng = StdRng::seed_from_u64(11);
        let reference = random_seq(&mut rng, 150);
        let snps = (40, 90);
        let mut caller = HaplotypeCaller::new(&gene(&reference, snps), &AlignScoring::default());

        // Query covers reference[20..120] with unrelated sequence on both sides
        let edited = with_bases(&reference, &[(snps.0, 'T'), (snps.1, 'C')]);
        let query = format!(
            "{}{}{}",
            "GGGGGGGGGG",
            &edited[20..120],
            "CCCCCCCCCC"
        );
        let expected = format!(
            "{}{}",
            edited.as_bytes()[snps.0 - 1] as char,
            edited.as_bytes()[snps.1 - 1] as char
        )
        .to_lowercase();
        assert_eq!(caller.call(&query), expected);
        assert_eq!(caller.call(&reverse_complement(&query)), expected);
    }

    #[test]
    fn uncovered_snp_reads_as_gap() {
        let mut rng = StdRng::seed_from_u64(3);
        let reference = random_seq(&mut rng, 120);
        let snps = (10, 100);
        let mut caller = HaplotypeCaller::new(&gene(&reference, snps), &AlignScoring::default());
        let query = &reference[30..120];
        let code = caller.call(query);
        assert!(code.starts_with('-'));
        assert_eq!(code.len(), 2);
    }
}
