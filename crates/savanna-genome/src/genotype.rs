//! Genotype construction, crossover and repair.

use crate::validation::{validate_genes, validate_parameters};
use rand::seq::SliceRandom;
use rand::Rng;
use savanna_core::{Direction, Error, GeneCounts, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// A complete, canonical genome. Two genotypes are equal when they carry the
/// same number of gene types and the same sorted loci.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGenotype")]
pub struct Genotype {
    gene_types: u8,
    genes: Vec<u8>,
}

/// Wire form of a genotype, checked by `from_genes` before use
#[derive(Deserialize)]
struct RawGenotype {
    gene_types: u8,
    genes: Vec<u8>,
}

impl TryFrom<RawGenotype> for Genotype {
    type Error = Error;

    fn try_from(raw: RawGenotype) -> Result<Self> {
        Genotype::from_genes(raw.genes, raw.gene_types)
    }
}

impl Genotype {
    /// Draw every locus uniformly, then repair the result
    pub fn random<R: Rng + ?Sized>(length: i32, gene_types: i32, rng: &mut R) -> Result<Self> {
        validate_parameters(length, gene_types)?;

        let gene_types = gene_types as u8;
        let mut genes: Vec<u8> = (0..length).map(|_| rng.gen_range(0..gene_types)).collect();
        repair(&mut genes, gene_types, rng);

        Ok(Self { gene_types, genes })
    }

    /// Build a genotype from explicit loci. The loci must already cover every
    /// gene type; they are sorted into canonical order.
    pub fn from_genes(mut genes: Vec<u8>, gene_types: u8) -> Result<Self> {
        validate_genes(&genes, gene_types)?;
        genes.sort_unstable();
        Ok(Self { gene_types, genes })
    }

    /// Slice both parents into three contiguous segments and combine them.
    ///
    /// One parent, chosen by a fair coin, dominates and contributes two
    /// segments; the other contributes the remaining one. The child is repaired
    /// afterwards, so it always carries every gene type.
    pub fn crossover<R: Rng + ?Sized>(first: &Genotype, second: &Genotype, rng: &mut R) -> Result<Self> {
        if first.len() != second.len() {
            return Err(Error::invalid_argument(format!(
                "Genomes are not of the same length: {} and {}",
                first.len(),
                second.len()
            )));
        }

        if first.gene_types != second.gene_types {
            return Err(Error::invalid_argument(format!(
                "Genomes are not compatible: {} and {} gene types",
                first.gene_types, second.gene_types
            )));
        }

        let (dominant, other) = if rng.gen_bool(0.5) {
            (first, second)
        } else {
            (second, first)
        };

        let length = first.len();
        let (first_cut, second_cut) = cut_points(length, rng);
        let segments = [0..first_cut, first_cut..second_cut, second_cut..length];

        let mut order = [0usize, 1, 2];
        order.shuffle(rng);
        // The first two picks come from the dominant parent, the last from the other
        let recessive_segment = segments[order[2]].clone();

        let mut genes = dominant.genes.clone();
        genes[recessive_segment.clone()].copy_from_slice(&other.genes[recessive_segment.clone()]);

        trace!(
            length,
            first_cut,
            second_cut,
            recessive_start = recessive_segment.start,
            recessive_end = recessive_segment.end,
            "Crossed genomes"
        );

        repair(&mut genes, first.gene_types, rng);

        Ok(Self {
            gene_types: first.gene_types,
            genes,
        })
    }

    /// Pick a uniformly random locus and return its direction
    pub fn random_direction<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Direction> {
        let gene = self.genes.choose(rng)?;
        Direction::from_code(*gene)
    }

    /// Number of loci carrying each gene type
    pub fn gene_counts(&self) -> GeneCounts {
        let mut counts = [0u64; Direction::COUNT];
        for &gene in &self.genes {
            counts[gene as usize] += 1;
        }
        counts
    }

    pub fn genes(&self) -> &[u8] {
        &self.genes
    }

    pub fn gene_types(&self) -> u8 {
        self.gene_types
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for gene in &self.genes {
            write!(f, "{}", gene)?;
        }
        Ok(())
    }
}

/// Two boundaries splitting `length` loci into three segments. Segments are
/// non-empty whenever the genome has at least three loci.
fn cut_points<R: Rng + ?Sized>(length: usize, rng: &mut R) -> (usize, usize) {
    if length >= 3 {
        let first = rng.gen_range(1..length - 1);
        let second = rng.gen_range(first + 1..length);
        (first, second)
    } else {
        let first = rng.gen_range(0..=length);
        let second = rng.gen_range(first..=length);
        (first, second)
    }
}

/// Make every gene type occur at least once, then sort.
///
/// Missing types overwrite random loci whose type occurs more than once, so no
/// present type is ever lost. The donor pool cannot run dry while a type is
/// missing because the genome is at least as long as the number of types.
fn repair<R: Rng + ?Sized>(genes: &mut [u8], gene_types: u8, rng: &mut R) {
    let mut counts = [0usize; Direction::COUNT];
    for &gene in genes.iter() {
        counts[gene as usize] += 1;
    }

    let mut donors: Vec<usize> = (0..genes.len())
        .filter(|&locus| counts[genes[locus] as usize] > 1)
        .collect();

    for missing in 0..gene_types {
        if counts[missing as usize] > 0 {
            continue;
        }

        let locus = donors.swap_remove(rng.gen_range(0..donors.len()));
        let donor_type = genes[locus];

        genes[locus] = missing;
        counts[missing as usize] = 1;
        counts[donor_type as usize] -= 1;

        if counts[donor_type as usize] == 1 {
            donors.retain(|&candidate| genes[candidate] != donor_type);
        }
    }

    genes.sort_unstable();
}
