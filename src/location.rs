use crate::attributes::Attributes;
use crate::types::LocationId;

/// A named place in the dataset. Identity (`id`, `name`) is fixed at
/// construction; only the attribute bag is mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    id: LocationId,
    name: String,
    attributes: Attributes,
}

impl Location {
    pub fn new(id: impl Into<LocationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> &LocationId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}
