pub mod ownership_graph;
