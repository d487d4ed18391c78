use bio::alignment::pairwise::{Aligner, MatchParams};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignScoring {
    pub match_scr: i32,
    pub mism_scr: i32,
    pub gapo_scr: i32,
    pub gape_scr: i32,
}

impl Default for AlignScoring {
    fn default() -> Self {
        AlignScoring {
            match_scr: 2,
            mism_scr: 1,
            gapo_scr: 4,
            gape_scr: 1,
        }
    }
}

impl AlignScoring {
    /// Builds a rust-bio aligner; penalties are stored as non-negative values
    /// and negated here.
    pub fn aligner(&self, likely_max_len: usize) -> Aligner<MatchParams> {
        Aligner::with_capacity(
            likely_max_len,
            likely_max_len,
            -self.gapo_scr,
            -self.gape_scr,
            MatchParams::new(self.match_scr, -self.mism_scr),
        )
    }
}
