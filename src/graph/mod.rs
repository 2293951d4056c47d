mod builder;
mod graph;

pub use builder::RegionGraphBuilder;
pub use graph::RegionGraph;
