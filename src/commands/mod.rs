pub mod cluster;
pub mod haplotype;
pub mod prepare;
pub mod submit;
