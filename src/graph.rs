use std::{cmp::Reverse,
          collections::BinaryHeap,
          fs::File,
          io::{prelude::*, BufReader, Lines},
          str::FromStr};

use rand::Rng;
use serde::Serialize;

use crate::binary_minheap::IndexedBinaryHeap;
use crate::error::{IPQError, IPQResult};

/// A directed graph edge with source, target and distance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub src: usize,
    pub tgt: usize,
    pub dist: usize,
}

/// A directed graph with edges sorted by source and node offsets into the edges
#[derive(Debug, Serialize)]
pub struct Graph {
    pub edges: Vec<Edge>,
    pub offsets: Vec<usize>,
    pub num_nodes: usize,
    pub num_edges: usize,
}

/// Get the next line from `lines` or fail with a parse error mentioning `what`
fn next_line<B: BufRead>(lines: &mut Lines<B>, line_no: &mut usize, what: &str) -> IPQResult<String> {
    *line_no += 1;
    match lines.next() {
        Some(line) => Ok(line?),
        None => Err(IPQError::Parse {
            message: format!("Unexpected EOF while parsing {} in line {}", what, line_no)
        })
    }
}

/// Parse the next whitespace separated field of a line
fn parse_field<'a, F: FromStr>(split: &mut impl Iterator<Item = &'a str>, line_no: usize, what: &str) -> IPQResult<F> {
    let field = split.next()
        .ok_or_else(|| IPQError::Parse {
            message: format!("Unexpected EOL while parsing {} in line {}", what, line_no)
        })?;
    field.parse().map_err(|_| {
        log::warn!("Cannot parse {} from '{}'", what, field);
        IPQError::Parse {
            message: format!("Invalid {} '{}' in line {}", what, field, line_no)
        }
    })
}

impl Graph {
    /// Create a directed graph with `num_nodes` nodes from `edges`.
    /// Fails if an edge refers to a node that does not exist.
    pub fn from_edges(num_nodes: usize, mut edges: Vec<Edge>) -> IPQResult<Self> {
        if let Some(edge) = edges.iter().find(|e| e.src >= num_nodes || e.tgt >= num_nodes) {
            let node = if edge.src >= num_nodes { edge.src } else { edge.tgt };
            return Err(IPQError::InvalidNode { node });
        }
        edges.sort_by_key(|e| e.src);

        let mut offsets = vec![0; num_nodes + 1];
        for edge in &edges {
            offsets[edge.src + 1] += 1;
        }
        for i in 0..num_nodes {
            offsets[i + 1] += offsets[i];
        }

        Ok(Self {
            num_nodes,
            num_edges: edges.len(),
            edges,
            offsets,
        })
    }

    /// Parse node and edge data from a file in FMI format into a directed graph
    pub fn parse_from_file(graph_file_path: &str) -> IPQResult<Self> {
        let graph_file = File::open(graph_file_path)?;
        let graph = Self::parse(BufReader::new(graph_file))?;
        log::debug!("Parsed graph {} with {} nodes and {} edges",
                    graph_file_path, graph.num_nodes, graph.num_edges);
        Ok(graph)
    }

    /// Parse a graph in FMI format from `reader`
    fn parse<R: BufRead>(reader: R) -> IPQResult<Self> {
        let mut lines = reader.lines();
        let mut line_no = 0;

        let mut line = next_line(&mut lines, &mut line_no, "header")?;
        while line.starts_with('#') || line.trim().is_empty() {
            line = next_line(&mut lines, &mut line_no, "header")?;
        }

        let num_nodes: usize = parse_field(&mut line.split_whitespace(), line_no, "number of nodes")?;
        let line = next_line(&mut lines, &mut line_no, "number of edges")?;
        let num_edges: usize = parse_field(&mut line.split_whitespace(), line_no, "number of edges")?;

        // Node lines carry ids and coordinates which are not needed here
        for _ in 0..num_nodes {
            next_line(&mut lines, &mut line_no, "nodes")?;
        }

        // Not reserved from the header count, which may be bogus
        let mut edges = Vec::new();
        for _ in 0..num_edges {
            let line = next_line(&mut lines, &mut line_no, "edges")?;
            let mut split = line.split_whitespace();
            edges.push(Edge {
                src: parse_field(&mut split, line_no, "edge source")?,
                tgt: parse_field(&mut split, line_no, "edge target")?,
                dist: parse_field(&mut split, line_no, "edge weight")?,
            });
        }

        Self::from_edges(num_nodes, edges)
    }

    /// Create a random directed graph with distances in `1..=max_dist`
    pub fn random<R: Rng>(num_nodes: usize, num_edges: usize, max_dist: usize, rng: &mut R) -> Self {
        if num_nodes == 0 {
            return Self {
                edges: Vec::new(),
                offsets: vec![0],
                num_nodes: 0,
                num_edges: 0,
            };
        }

        let edges = (0..num_edges)
            .map(|_| Edge {
                src: rng.gen_range(0..num_nodes),
                tgt: rng.gen_range(0..num_nodes),
                dist: rng.gen_range(1..=max_dist.max(1)),
            })
            .collect();

        match Self::from_edges(num_nodes, edges) {
            Ok(graph) => graph,
            Err(err) => unreachable!("random edges out of range: {}", err),
        }
    }

    /// Get the number of outgoing edges of the node with id `node_id`.
    /// Returns error if no such node exists.
    pub fn get_out_degree(&self, node_id: usize) -> IPQResult<usize> {
        self.check_node(node_id)?;
        Ok(self.offsets[node_id + 1] - self.offsets[node_id])
    }

    /// Get the outgoing edges of the node with id `node_id`.
    /// Returns error if no such node exists.
    pub fn out_edges(&self, node_id: usize) -> IPQResult<&[Edge]> {
        self.check_node(node_id)?;
        Ok(self.edges_of(node_id))
    }

    /// Outgoing edges of a node that is known to exist
    fn edges_of(&self, node_id: usize) -> &[Edge] {
        &self.edges[self.offsets[node_id]..self.offsets[node_id + 1]]
    }

    /// Fail with `InvalidNode` unless `node_id` is a node of this graph
    fn check_node(&self, node_id: usize) -> IPQResult<()> {
        if node_id < self.num_nodes {
            Ok(())
        } else {
            Err(IPQError::InvalidNode { node: node_id })
        }
    }

    /// Compute the shortest distances from `src_id` to all nodes with Dijkstra's algorithm.
    /// Unreachable nodes have no distance, and so do nodes whose distance exceeds `usize::MAX`.
    pub fn shortest_dists(&self, src_id: usize) -> IPQResult<Vec<Option<usize>>> {
        self.check_node(src_id)?;

        let mut dists: Vec<Option<usize>> = vec![None; self.num_nodes];
        let mut queue: IndexedBinaryHeap<usize> = IndexedBinaryHeap::with_capacity(self.num_nodes);
        queue.insert(0, src_id)?;

        while let Ok((dist, node_id)) = queue.extract_min() {
            dists[node_id] = Some(dist);
            for edge in self.edges_of(node_id) {
                if dists[edge.tgt].is_some() {
                    continue;
                }
                let new_dist = match dist.checked_add(edge.dist) {
                    Some(new_dist) => new_dist,
                    None => continue,
                };
                match queue.priority_of(edge.tgt) {
                    Some(&cur_dist) if cur_dist <= new_dist => (),
                    _ => queue.change_key(new_dist, edge.tgt)?,
                }
            }
        }

        Ok(dists)
    }

    /// Compute the same distances as [`shortest_dists`](Self::shortest_dists), but with
    /// a plain binary heap that keeps outdated entries around
    pub fn shortest_dists_lazy(&self, src_id: usize) -> IPQResult<Vec<Option<usize>>> {
        self.check_node(src_id)?;

        let mut dists: Vec<Option<usize>> = vec![None; self.num_nodes];
        let mut queue = BinaryHeap::new();
        queue.push(Reverse((0, src_id)));

        while let Some(Reverse((dist, node_id))) = queue.pop() {
            if dists[node_id].is_some() {
                continue;
            }
            dists[node_id] = Some(dist);
            for edge in self.edges_of(node_id) {
                if dists[edge.tgt].is_some() {
                    continue;
                }
                if let Some(new_dist) = dist.checked_add(edge.dist) {
                    queue.push(Reverse((new_dist, edge.tgt)));
                }
            }
        }

        Ok(dists)
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::error::IPQError;
    use crate::graph::{Edge, Graph};

    fn edge(src: usize, tgt: usize, dist: usize) -> Edge {
        Edge { src, tgt, dist }
    }

    #[test]
    fn test_from_edges() {
        let graph = Graph::from_edges(4, vec![
            edge(2, 3, 1),
            edge(0, 1, 4),
            edge(0, 2, 1),
            edge(2, 1, 2),
        ]).unwrap();

        assert_eq!(graph.num_edges, 4);
        assert_eq!(graph.offsets, vec![0, 2, 2, 4, 4]);
        assert_eq!(graph.get_out_degree(0).unwrap(), 2);
        assert_eq!(graph.get_out_degree(1).unwrap(), 0);
        assert!(graph.out_edges(2).unwrap().iter().all(|e| e.src == 2));
        assert!(matches!(graph.get_out_degree(4), Err(IPQError::InvalidNode { node: 4 })));
        assert!(matches!(graph.out_edges(usize::MAX), Err(IPQError::InvalidNode { .. })));

        assert!(matches!(Graph::from_edges(2, vec![edge(0, 5, 1)]),
                         Err(IPQError::InvalidNode { node: 5 })));
    }

    #[test]
    fn test_shortest_dists() {
        let graph = Graph::from_edges(5, vec![
            edge(0, 1, 4),
            edge(0, 2, 1),
            edge(2, 1, 2),
            edge(1, 3, 1),
            edge(2, 3, 5),
        ]).unwrap();

        let dists = graph.shortest_dists(0).unwrap();
        assert_eq!(dists, vec![Some(0), Some(3), Some(1), Some(4), None]);
        assert_eq!(dists, graph.shortest_dists_lazy(0).unwrap());

        assert!(matches!(graph.shortest_dists(5), Err(IPQError::InvalidNode { node: 5 })));
    }

    #[test]
    fn test_random_graphs() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..20 {
            let graph = Graph::random(300, 1200, 100, &mut rng);
            assert_eq!(graph.offsets[graph.num_nodes], graph.num_edges);
            for src in [0, 17, 299] {
                assert_eq!(graph.shortest_dists(src).unwrap(),
                           graph.shortest_dists_lazy(src).unwrap());
            }
        }

        let empty = Graph::random(0, 10, 5, &mut rng);
        assert_eq!(empty.num_edges, 0);
        assert!(empty.shortest_dists(0).is_err());
    }

    #[test]
    fn test_parse() {
        let graph = Graph::parse_from_file("resources/small.fmi").unwrap();

        assert_eq!(graph.num_nodes, 6);
        assert_eq!(graph.num_edges, 8);
        assert_eq!(graph.get_out_degree(0).unwrap(), 2);
        assert_eq!(graph.shortest_dists(0).unwrap(),
                   vec![Some(0), Some(2), Some(5), Some(6), Some(9), None]);
    }

    #[test]
    fn test_parse_errors() {
        let truncated = "# header\n\n3\n2\n0 0 1.0 2.0\n1 1 1.0 2.0\n2 2 1.0 2.0\n0 1 5\n";
        assert!(matches!(Graph::parse(truncated.as_bytes()), Err(IPQError::Parse { .. })));

        let invalid = "3\n1\na\nb\nc\n0 x 5\n";
        match Graph::parse(invalid.as_bytes()) {
            Err(IPQError::Parse { message }) => assert!(message.contains("edge target")),
            other => panic!("Unexpected result: {:?}", other),
        }

        assert!(matches!(Graph::parse_from_file("resources/missing.fmi"), Err(IPQError::Io(_))));

        // Huge edge count in the header with a truncated body
        let huge = "1\n100000000000000000\n0 0 1.0 2.0\n";
        assert!(matches!(Graph::parse(huge.as_bytes()), Err(IPQError::Parse { .. })));
    }

    #[test]
    fn test_distance_overflow() {
        let graph = Graph::from_edges(4, vec![
            edge(0, 1, usize::MAX),
            edge(1, 2, 1),
            edge(0, 3, usize::MAX - 1),
            edge(3, 2, 1),
        ]).unwrap();

        let dists = graph.shortest_dists(0).unwrap();
        assert_eq!(dists, vec![Some(0), Some(usize::MAX), Some(usize::MAX), Some(usize::MAX - 1)]);
        assert_eq!(dists, graph.shortest_dists_lazy(0).unwrap());

        let graph = Graph::from_edges(3, vec![edge(0, 1, usize::MAX), edge(1, 2, 1)]).unwrap();
        assert_eq!(graph.shortest_dists(0).unwrap(), vec![Some(0), Some(usize::MAX), None]);
        assert_eq!(graph.shortest_dists_lazy(0).unwrap(), vec![Some(0), Some(usize::MAX), None]);
    }

    #[test]
    fn test_serialize() {
        let graph = Graph::from_edges(3, vec![edge(1, 2, 7), edge(0, 1, 3)]).unwrap();
        let json: serde_json::Value = serde_json::to_value(&graph).unwrap();

        assert_eq!(json["num_nodes"], 3);
        assert_eq!(json["num_edges"], 2);
        assert_eq!(json["offsets"], serde_json::json!([0, 1, 2, 2]));
        assert_eq!(json["edges"][0], serde_json::json!({"src": 0, "tgt": 1, "dist": 3}));
    }
}
