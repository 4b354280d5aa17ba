pub mod enrich;
pub mod fk;
pub mod lookup;
pub mod topo;
pub mod tree;
