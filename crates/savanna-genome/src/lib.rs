//! Genomes steering animal movement.
//!
//! A genome is a fixed-length array of gene symbols. Each symbol is the code of
//! a `Direction`, and the frequency of a symbol is the probability of the animal
//! turning that way. Genomes are kept:
//! - Complete: every gene type appears at least once
//! - Canonical: loci are sorted, so equal distributions compare equal
//! - Reproducible: every random draw goes through a caller-supplied generator

pub mod genotype;
pub mod validation;

pub use genotype::Genotype;
pub use validation::{validate_genes, validate_parameters};
