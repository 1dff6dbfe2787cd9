use super::genome::{GenomeError, PROPERTY_SEPARATOR};
use std::fmt;

/// Number of identity fields carried by a genome.
const IDENTITY_FIELDS: usize = 5;

/// Lineage and bookkeeping for one entity.
///
/// Only `id`, `generation`, `origin_generation`, `mother_id` and `father_id`
/// are part of the genome. `fitness`, `age` and `average_speed` belong to the
/// current generation and start at 0 whenever an identity is decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    pub id: u32,
    pub generation: u32,
    pub origin_generation: u32,
    pub mother_id: Option<u32>,
    pub father_id: Option<u32>,
    pub fitness: f64,
    pub age: f64,
    pub average_speed: f64,
}

impl Identity {
    /// Identity of a randomly generated entity with no parents.
    pub fn founder(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Identity of a child bred from `mother` and `father`.
    ///
    /// The child keeps the mother's generation as is; the generation is not
    /// incremented at birth.
    pub fn child(id: u32, mother: &Identity, father: &Identity) -> Self {
        Self {
            id,
            generation: mother.generation,
            origin_generation: mother.origin_generation.min(father.origin_generation),
            mother_id: Some(mother.id),
            father_id: Some(father.id),
            ..Self::default()
        }
    }

    /// Copy of the genome fields under a different id.
    pub fn renumbered(&self, id: u32) -> Self {
        Self {
            id,
            generation: self.generation,
            origin_generation: self.origin_generation,
            mother_id: self.mother_id,
            father_id: self.father_id,
            ..Self::default()
        }
    }

    pub fn is_founder(&self) -> bool {
        self.mother_id.is_none() && self.father_id.is_none()
    }

    /// Parses `id-generation-originGeneration-motherId-fatherId`.
    ///
    /// Empty parent fields decode to `None`. Fields past the fifth are
    /// accepted and dropped.
    pub fn decode(identity: &str) -> Result<Self, GenomeError> {
        let fields: Vec<&str> = identity.split(PROPERTY_SEPARATOR).collect();
        if fields.len() < IDENTITY_FIELDS {
            return Err(GenomeError::IdentityFieldCount {
                count: fields.len(),
                identity: identity.to_string(),
            });
        }

        Ok(Self {
            id: parse_field("id", fields[0])?,
            generation: parse_field("generation", fields[1])?,
            origin_generation: parse_field("origin_generation", fields[2])?,
            mother_id: parse_parent("mother_id", fields[3])?,
            father_id: parse_parent("father_id", fields[4])?,
            ..Self::default()
        })
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<u32, GenomeError> {
    value
        .parse()
        .map_err(|_| GenomeError::invalid_number(field, value))
}

fn parse_parent(field: &'static str, value: &str) -> Result<Option<u32>, GenomeError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_field(field, value).map(Some)
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parent = |id: Option<u32>| id.map(|id| id.to_string()).unwrap_or_default();

        write!(
            f,
            "{id}{sep}{generation}{sep}{origin}{sep}{mother}{sep}{father}",
            id = self.id,
            generation = self.generation,
            origin = self.origin_generation,
            mother = parent(self.mother_id),
            father = parent(self.father_id),
            sep = PROPERTY_SEPARATOR,
        )
    }
}
