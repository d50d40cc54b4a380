//! Validation for genome parameters and gene arrays.

use savanna_core::{Direction, Error, Result};

/// Validate the shape of a genome before any locus is drawn
pub fn validate_parameters(length: i32, gene_types: i32) -> Result<()> {
    if length < 0 {
        return Err(Error::invalid_argument("Genome length can't be negative"));
    }

    if gene_types < 0 || gene_types > length {
        return Err(Error::invalid_argument(format!(
            "Incorrect number of gene types: {} for a genome of length {}",
            gene_types, length
        )));
    }

    if gene_types as usize > Direction::COUNT {
        return Err(Error::invalid_argument(format!(
            "At most {} gene types can be mapped to directions, got {}",
            Direction::COUNT,
            gene_types
        )));
    }

    if gene_types == 0 && length > 0 {
        return Err(Error::invalid_argument(
            "A non-empty genome needs at least one gene type",
        ));
    }

    Ok(())
}

/// Validate that a gene array is complete: every symbol is in range and every
/// gene type occurs at least once
pub fn validate_genes(genes: &[u8], gene_types: u8) -> Result<()> {
    validate_parameters(genes.len() as i32, gene_types as i32)?;

    let mut seen = [false; Direction::COUNT];

    for (locus, &gene) in genes.iter().enumerate() {
        if gene >= gene_types {
            return Err(Error::invalid_argument(format!(
                "Gene {} at locus {} is outside [0, {})",
                gene, locus, gene_types
            )));
        }
        seen[gene as usize] = true;
    }

    if let Some(missing) = (0..gene_types).find(|&gene_type| !seen[gene_type as usize]) {
        return Err(Error::invalid_argument(format!(
            "Gene type {} does not occur in the genome",
            missing
        )));
    }

    Ok(())
}
