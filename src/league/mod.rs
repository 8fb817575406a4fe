// League data model: positions and immutable weekly facts.

pub mod facts;
pub mod position;
