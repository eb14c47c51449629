use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    candidates::{CandidateStrategy, DescentParams},
    error::{DescentError, Result},
    random::RngState,
    sets::heap::{NeighborHeap, PointId, push_into_row},
    statistics::Stats,
};

/// A candidate push deferred to the merge phase of a partitioned round.
#[derive(Debug, Clone, Copy)]
struct Edge {
    target: PointId,
    priority: f32,
    neighbor: PointId,
    is_new: bool,
}

/// Generates the candidate heap of one neighbor descent round.
///
/// For every populated slot `(i -> nb)` among the first `n_neighbors` slots of
/// the first `n_vertices` graph rows, a random priority `d` is drawn and both
/// `(nb, d)` into row `i` and `(i, d)` into row `nb` are offered to a fresh
/// heap of `max_candidates` slots per row, carrying the slot's is-new flag.
/// The graph slot's flag is then cleared, whether or not either push was
/// accepted. The random priority only decides which candidates survive the
/// capacity bound; it has nothing to do with distances.
///
/// # Scheduling
/// Candidate rows are written from two sides (row `i` and row `nb`), so vertex
/// iterations cannot simply run in parallel. [`CandidateStrategy::Partitioned`]
/// instead lets each worker own a contiguous block of graph rows and a forked
/// random stream, records the pushes it would make, and replays them per
/// candidate row in partition order. Every candidate row is then mutated by a
/// single task, in the same relative order a serial run over the same streams
/// would use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateBuilder {
    n_vertices: usize,
    n_neighbors: usize,
    max_candidates: usize,
    strategy: CandidateStrategy,
}

impl CandidateBuilder {
    /// Creates a serial builder.
    ///
    /// # Arguments
    /// * `n_vertices` - Number of leading graph rows to process
    /// * `n_neighbors` - Number of leading slots of each row to process
    /// * `max_candidates` - Capacity of each row of the candidate heap
    ///
    /// # Returns
    /// A builder using [`CandidateStrategy::Serial`]. Shapes are only checked
    /// against a graph when [`build`](Self::build) runs.
    pub fn new(n_vertices: usize, n_neighbors: usize, max_candidates: usize) -> Self {
        CandidateBuilder {
            n_vertices,
            n_neighbors,
            max_candidates,
            strategy: CandidateStrategy::Serial,
        }
    }

    /// Creates a builder from loaded parameters.
    ///
    /// # Arguments
    /// * `params` - Supplies `n_neighbors`, `max_candidates` and the strategy
    /// * `n_vertices` - Number of leading graph rows to process
    ///
    /// # Returns
    /// A builder with the strategy of `params`. Its `seed` is not used here,
    /// the caller owns the random state passed to [`build`](Self::build).
    pub fn from_params(params: &DescentParams, n_vertices: usize) -> Self {
        CandidateBuilder {
            n_vertices,
            n_neighbors: params.n_neighbors,
            max_candidates: params.max_candidates,
            strategy: params.strategy,
        }
    }

    /// Replaces the scheduling strategy.
    ///
    /// # Arguments
    /// * `strategy` - Serial, or partitioned over a number of workers
    ///
    /// # Returns
    /// The same builder with `strategy` set. A partitioned strategy with zero
    /// workers is refused by [`build`](Self::build), not here.
    pub fn with_strategy(mut self, strategy: CandidateStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> CandidateStrategy {
        self.strategy
    }

    /// Checks that the graph can be processed without an out-of-range access.
    /// Runs before any mutation, so a refused graph is left untouched.
    fn validate(&self, graph: &NeighborHeap) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(DescentError::ZeroCapacity);
        }
        if self.n_vertices > graph.n_points() {
            return Err(DescentError::VerticesExceedRows {
                n_vertices: self.n_vertices,
                n_points: graph.n_points(),
            });
        }
        if self.n_neighbors > graph.capacity() {
            return Err(DescentError::NeighborsExceedCapacity {
                n_neighbors: self.n_neighbors,
                capacity: graph.capacity(),
            });
        }
        if let CandidateStrategy::Partitioned { workers: 0 } = self.strategy {
            return Err(DescentError::NoWorkers);
        }

        for row in 0..self.n_vertices {
            for slot in &graph.row(row)[..self.n_neighbors] {
                match slot.index() {
                    Some(neighbor) if neighbor >= self.n_vertices => {
                        return Err(DescentError::NeighborOutOfRange {
                            row,
                            neighbor,
                            n_vertices: self.n_vertices,
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Builds the candidate heap for the next round, clearing the is-new flag
    /// of every processed graph slot.
    ///
    /// # Errors
    /// Fails, without touching `graph` or `rng`, when the builder's shape does
    /// not fit the graph (see [`DescentError`]).
    pub fn build(
        &self,
        graph: &mut NeighborHeap,
        rng: &mut RngState,
        stats: &mut Stats,
    ) -> Result<NeighborHeap> {
        self.validate(graph)?;

        let mut candidates = NeighborHeap::new(self.n_vertices, self.max_candidates)?;
        let (edges, accepted) = match self.strategy {
            CandidateStrategy::Partitioned { workers } if workers > 1 && self.n_vertices > 1 => {
                self.build_partitioned(graph, &mut candidates, rng, workers)
            }
            _ => self.build_serial(graph, &mut candidates, rng),
        };

        stats.bump_rounds();
        stats.bump_edges(edges);
        stats.bump_pushes(2 * edges, accepted);
        debug!(
            n_vertices = self.n_vertices,
            edges,
            accepted,
            strategy = ?self.strategy,
            "built candidate heap"
        );

        Ok(candidates)
    }

    /// Returns `(edges visited, pushes accepted)`.
    fn build_serial(
        &self,
        graph: &mut NeighborHeap,
        candidates: &mut NeighborHeap,
        rng: &mut RngState,
    ) -> (usize, usize) {
        let mut edges = 0;
        let mut accepted = 0;

        for i in 0..self.n_vertices {
            for j in 0..self.n_neighbors {
                let slot = graph.row(i)[j];
                let Some(neighbor) = slot.index() else {
                    continue;
                };
                let is_new = slot.is_new();

                let priority = rng.next_float01();
                accepted += candidates.push(i, priority, neighbor, is_new);
                accepted += candidates.push(neighbor, priority, i, is_new);

                graph.clear_flag(i, j);
                edges += 1;
            }
        }

        (edges, accepted)
    }

    /// Returns `(edges visited, pushes accepted)`.
    fn build_partitioned(
        &self,
        graph: &mut NeighborHeap,
        candidates: &mut NeighborHeap,
        rng: &mut RngState,
        workers: usize,
    ) -> (usize, usize) {
        let rows_per_block = self.n_vertices.div_ceil(workers.min(self.n_vertices));
        let n_blocks = self.n_vertices.div_ceil(rows_per_block);
        let capacity = graph.capacity();
        let n_neighbors = self.n_neighbors;

        // forked in block order, so the streams only depend on (rng, workers)
        let streams: Vec<RngState> = (0..n_blocks).map(|_| rng.fork()).collect();

        // phase 1: every block owns its graph rows and records its pushes
        let emitted: Vec<Vec<Edge>> = graph
            .par_row_blocks_mut(rows_per_block, self.n_vertices)
            .zip(streams.into_par_iter())
            .enumerate()
            .map(|(block, (slots, mut stream))| {
                let first_row = block * rows_per_block;
                let mut edges = Vec::new();

                for (offset, row) in slots.chunks_exact_mut(capacity).enumerate() {
                    let i = first_row + offset;
                    for slot in row[..n_neighbors].iter_mut() {
                        let Some(neighbor) = slot.index else {
                            continue;
                        };
                        let priority = stream.next_float01();
                        edges.push(Edge {
                            target: i,
                            priority,
                            neighbor,
                            is_new: slot.is_new,
                        });
                        edges.push(Edge {
                            target: neighbor,
                            priority,
                            neighbor: i,
                            is_new: slot.is_new,
                        });
                        slot.is_new = false;
                    }
                }

                trace!(block, first_row, pushes = edges.len(), "partition scanned");
                edges
            })
            .collect();

        // phase 2: bucket by candidate row, keeping block order within a row
        let total_pushes: usize = emitted.iter().map(Vec::len).sum();
        let mut buckets: Vec<Vec<Edge>> = vec![Vec::new(); self.n_vertices];
        for edge in emitted.into_iter().flatten() {
            buckets[edge.target].push(edge);
        }

        let accepted: usize = candidates
            .par_rows_mut()
            .zip(buckets.par_iter())
            .map(|(row, bucket)| {
                bucket
                    .iter()
                    .map(|e| push_into_row(row, e.priority, e.neighbor, e.is_new))
                    .sum::<usize>()
            })
            .sum();

        (total_pushes / 2, accepted)
    }
}

/// Serial candidate building with throwaway statistics.
///
/// Equivalent to `CandidateBuilder::new(n_vertices, n_neighbors,
/// max_candidates).build(graph, rng, &mut Stats::new())`.
pub fn build_candidates(
    graph: &mut NeighborHeap,
    n_vertices: usize,
    n_neighbors: usize,
    max_candidates: usize,
    rng: &mut RngState,
) -> Result<NeighborHeap> {
    CandidateBuilder::new(n_vertices, n_neighbors, max_candidates).build(
        graph,
        rng,
        &mut Stats::new(),
    )
}

#[cfg(test)]
mod tests {
    use hashbrown::HashSet;

    use super::*;
    use crate::random::rejection_sample;

    /// Random graph where every row holds `k` distinct random neighbors, all
    /// flagged new, weighted by a fake distance.
    fn random_graph(n: usize, k: usize, seed: u64) -> NeighborHeap {
        let mut rng = RngState::from_seed(seed);
        let mut graph = NeighborHeap::new(n, k).unwrap();
        for i in 0..n {
            for j in rejection_sample(k, n, &mut rng) {
                let fake_distance = ((i as f32) - (j as f32)).abs();
                graph.push(i, fake_distance, j, true);
            }
        }
        graph
    }

    fn populated(heap: &NeighborHeap, row: usize) -> HashSet<(PointId, bool)> {
        heap.row(row)
            .iter()
            .filter_map(|s| s.index().map(|i| (i, s.is_new())))
            .collect()
    }

    #[test]
    fn test_single_edge_goes_both_ways() {
        let mut graph = NeighborHeap::new(3, 2).unwrap();
        graph.push(0, 1.0, 2, true);
        let mut rng = RngState::from_seed(1);

        let candidates = build_candidates(&mut graph, 3, 2, 4, &mut rng).unwrap();
        assert_eq!(populated(&candidates, 0), HashSet::from([(2, true)]));
        assert_eq!(populated(&candidates, 2), HashSet::from([(0, true)]));
        assert!(populated(&candidates, 1).is_empty());
        assert_eq!(graph.count_flagged(), 0);
    }

    #[test]
    fn test_old_edges_keep_their_flag() {
        let mut graph = NeighborHeap::new(2, 1).unwrap();
        graph.push(1, 0.5, 0, false);
        let mut rng = RngState::from_seed(1);

        let candidates = build_candidates(&mut graph, 2, 1, 3, &mut rng).unwrap();
        assert_eq!(populated(&candidates, 1), HashSet::from([(0, false)]));
        assert_eq!(populated(&candidates, 0), HashSet::from([(1, false)]));
    }

    #[test]
    fn test_flags_cleared_even_when_pushes_fail() {
        // capacity 1 candidate rows: most pushes are rejected
        let mut graph = random_graph(30, 6, 3);
        let mut rng = RngState::from_seed(4);
        let mut stats = Stats::new();

        let candidates = CandidateBuilder::new(30, 6, 1)
            .build(&mut graph, &mut rng, &mut stats)
            .unwrap();
        assert_eq!(graph.count_flagged(), 0);
        assert!(stats.get_pushes_rejected() > 0);
        assert_eq!(stats.get_edges_visited(), 30 * 6);
        assert_eq!(
            stats.get_pushes_accepted() + stats.get_pushes_rejected(),
            2 * 30 * 6
        );
        candidates.check_invariants().unwrap();
    }

    #[test]
    fn test_only_first_neighbors_are_processed() {
        let mut graph = random_graph(10, 4, 8);
        let mut rng = RngState::from_seed(2);
        let mut stats = Stats::new();

        CandidateBuilder::new(10, 2, 8)
            .build(&mut graph, &mut rng, &mut stats)
            .unwrap();
        assert_eq!(stats.get_edges_visited(), 20);
        for row in 0..10 {
            assert!(graph.row(row)[..2].iter().all(|s| !s.is_new()));
            assert!(graph.row(row)[2..].iter().all(|s| s.is_new()));
        }
    }

    #[test]
    fn test_partitioned_skips_trailing_slots_and_rows() {
        // 12 rows of 4 neighbors, all inside the first 9 vertices
        let mut graph = NeighborHeap::new(12, 4).unwrap();
        for i in 0..12 {
            for step in 1..=4 {
                graph.push(i, step as f32, (i + step) % 9, true);
            }
        }
        let mut rng = RngState::from_seed(2);
        let mut stats = Stats::new();

        let candidates = CandidateBuilder::new(9, 2, 8)
            .with_strategy(CandidateStrategy::Partitioned { workers: 3 })
            .build(&mut graph, &mut rng, &mut stats)
            .unwrap();
        candidates.check_invariants().unwrap();
        assert_eq!(stats.get_edges_visited(), 9 * 2);
        for row in 0..9 {
            assert!(graph.row(row)[..2].iter().all(|s| !s.is_new()));
            assert!(graph.row(row)[2..].iter().all(|s| s.is_new()));
        }
        for row in 9..12 {
            assert!(graph.row(row).iter().all(|s| s.is_new()));
        }
    }

    #[test]
    fn test_candidates_come_from_graph_edges() {
        let n = 40;
        let mut graph = random_graph(n, 5, 11);
        let edges: HashSet<(PointId, PointId)> = (0..n)
            .flat_map(|i| {
                graph
                    .row(i)
                    .iter()
                    .filter_map(move |s| s.index().map(|j| (i, j)))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut rng = RngState::from_seed(12);
        let candidates = build_candidates(&mut graph, n, 5, 7, &mut rng).unwrap();
        candidates.check_invariants().unwrap();
        for i in 0..n {
            for slot in candidates.row(i) {
                if let Some(j) = slot.index() {
                    assert!(edges.contains(&(i, j)) || edges.contains(&(j, i)));
                }
            }
        }
    }

    #[test]
    fn test_serial_is_deterministic() {
        let mut g1 = random_graph(25, 5, 6);
        let mut g2 = random_graph(25, 5, 6);
        let mut r1 = RngState::from_seed(99);
        let mut r2 = RngState::from_seed(99);

        let c1 = build_candidates(&mut g1, 25, 5, 6, &mut r1).unwrap();
        let c2 = build_candidates(&mut g2, 25, 5, 6, &mut r2).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(g1, g2);
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_partitioned_is_deterministic() {
        let builder = CandidateBuilder::new(60, 6, 8)
            .with_strategy(CandidateStrategy::Partitioned { workers: 4 });
        let mut g1 = random_graph(60, 6, 21);
        let mut g2 = random_graph(60, 6, 21);
        let mut r1 = RngState::from_seed(5);
        let mut r2 = RngState::from_seed(5);

        let c1 = builder.build(&mut g1, &mut r1, &mut Stats::new()).unwrap();
        let c2 = builder.build(&mut g2, &mut r2, &mut Stats::new()).unwrap();
        assert_eq!(c1, c2);
        assert_eq!(r1, r2);
        assert_eq!(g1.count_flagged(), 0);
        c1.check_invariants().unwrap();
    }

    #[test]
    fn test_partitioned_matches_serial_replay_of_streams() {
        // a serial run that switches to the next forked stream at every block
        // boundary must produce the same heap as the partitioned run
        let (n, k, m, workers) = (23, 4, 5, 3);
        let mut g_par = random_graph(n, k, 31);
        let mut g_ser = g_par.clone();
        let mut rng = RngState::from_seed(77);
        let mut rng_ser = rng;

        let partitioned = CandidateBuilder::new(n, k, m)
            .with_strategy(CandidateStrategy::Partitioned { workers })
            .build(&mut g_par, &mut rng, &mut Stats::new())
            .unwrap();

        let rows_per_block = n.div_ceil(workers);
        let mut streams: Vec<RngState> = (0..n.div_ceil(rows_per_block))
            .map(|_| rng_ser.fork())
            .collect();
        let mut serial = NeighborHeap::new(n, m).unwrap();
        for i in 0..n {
            let stream = &mut streams[i / rows_per_block];
            for j in 0..k {
                let slot = g_ser.row(i)[j];
                if let Some(nb) = slot.index() {
                    let d = stream.next_float01();
                    serial.push(i, d, nb, slot.is_new());
                    serial.push(nb, d, i, slot.is_new());
                    g_ser.clear_flag(i, j);
                }
            }
        }

        assert_eq!(partitioned, serial);
        assert_eq!(g_par, g_ser);
        assert_eq!(rng, rng_ser);
    }

    #[test]
    fn test_single_worker_equals_serial() {
        let mut g1 = random_graph(20, 4, 2);
        let mut g2 = g1.clone();
        let mut r1 = RngState::from_seed(8);
        let mut r2 = r1;

        let serial = build_candidates(&mut g1, 20, 4, 5, &mut r1).unwrap();
        let partitioned = CandidateBuilder::new(20, 4, 5)
            .with_strategy(CandidateStrategy::Partitioned { workers: 1 })
            .build(&mut g2, &mut r2, &mut Stats::new())
            .unwrap();
        assert_eq!(serial, partitioned);
        assert_eq!(r1, r2);
    }

    #[test]
    fn test_more_workers_than_vertices() {
        let mut graph = random_graph(5, 2, 4);
        let mut rng = RngState::from_seed(3);
        let candidates = CandidateBuilder::new(5, 2, 3)
            .with_strategy(CandidateStrategy::Partitioned { workers: 64 })
            .build(&mut graph, &mut rng, &mut Stats::new())
            .unwrap();
        assert_eq!(candidates.n_points(), 5);
        assert_eq!(graph.count_flagged(), 0);
    }

    #[test]
    fn test_empty_graph_yields_empty_candidates() {
        let mut graph = NeighborHeap::new(0, 3).unwrap();
        let mut rng = RngState::from_seed(3);
        let before = rng;
        let candidates = build_candidates(&mut graph, 0, 3, 3, &mut rng).unwrap();
        assert_eq!(candidates.n_points(), 0);
        assert_eq!(rng, before);
    }

    #[test]
    fn test_shape_errors_leave_graph_untouched() {
        let mut graph = random_graph(6, 3, 1);
        let before = graph.clone();
        let mut rng = RngState::from_seed(3);
        let rng_before = rng;

        assert!(matches!(
            build_candidates(&mut graph, 7, 3, 3, &mut rng),
            Err(DescentError::VerticesExceedRows { n_vertices: 7, n_points: 6 })
        ));
        assert!(matches!(
            build_candidates(&mut graph, 6, 4, 3, &mut rng),
            Err(DescentError::NeighborsExceedCapacity { n_neighbors: 4, capacity: 3 })
        ));
        assert!(matches!(
            build_candidates(&mut graph, 6, 3, 0, &mut rng),
            Err(DescentError::ZeroCapacity)
        ));
        assert!(matches!(
            CandidateBuilder::new(6, 3, 3)
                .with_strategy(CandidateStrategy::Partitioned { workers: 0 })
                .build(&mut graph, &mut rng, &mut Stats::new()),
            Err(DescentError::NoWorkers)
        ));

        assert_eq!(graph, before);
        assert_eq!(rng, rng_before);
    }

    #[test]
    fn test_neighbor_outside_vertex_range() {
        let mut graph = NeighborHeap::new(6, 2).unwrap();
        graph.push(1, 1.0, 5, true);
        let before = graph.clone();
        let mut rng = RngState::from_seed(3);

        let err = build_candidates(&mut graph, 4, 2, 3, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            DescentError::NeighborOutOfRange {
                row: 1,
                neighbor: 5,
                n_vertices: 4
            }
        ));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_from_params() {
        let params = DescentParams {
            n_neighbors: 3,
            max_candidates: 9,
            seed: 1,
            strategy: CandidateStrategy::Partitioned { workers: 2 },
        };
        let builder = CandidateBuilder::from_params(&params, 100);
        assert_eq!(
            builder,
            CandidateBuilder::new(100, 3, 9)
                .with_strategy(CandidateStrategy::Partitioned { workers: 2 })
        );
        assert_eq!(builder.strategy(), params.strategy);
    }
}
