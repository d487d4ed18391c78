//! # dihybrid
//! Calls two-SNP haplotypes from PacBio amplicon reads.
//!
//! The pipeline has two independently invokable stages:
//! 1. `cluster` runs `pbaa cluster` once per sample, concurrently, skipping
//!    samples that already have a complete result under `execution/`.
//! 2. `haplotype` reads the cluster consensus sequences, aligns each one to the
//!    gene's guide sequence and reports per-cluster calls and per-sample
//!    read counts for every configured haplotype.
pub mod cli;
pub mod commands;
pub mod execution;
pub mod haplotype;
pub mod utils;
