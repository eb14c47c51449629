use serde::Serialize;

/// Counters collected while building candidate heaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    rounds: usize,
    edges_visited: usize,
    pushes_accepted: usize,
    pushes_rejected: usize,
}

impl Stats {
    pub fn new() -> Self {
        Stats {
            rounds: 0,
            edges_visited: 0,
            pushes_accepted: 0,
            pushes_rejected: 0,
        }
    }

    /// Record that a full candidate round has been performed
    pub fn bump_rounds(&mut self) {
        self.rounds += 1
    }

    /// Record that graph edges were turned into candidate pushes
    pub fn bump_edges(&mut self, edge_amount: usize) {
        self.edges_visited += edge_amount
    }

    /// Record the outcome of `attempted` pushes, `accepted` of which made it in
    pub fn bump_pushes(&mut self, attempted: usize, accepted: usize) {
        debug_assert!(accepted <= attempted);
        self.pushes_accepted += accepted;
        self.pushes_rejected += attempted - accepted;
    }

    pub fn get_rounds(&self) -> usize {
        self.rounds
    }

    pub fn get_edges_visited(&self) -> usize {
        self.edges_visited
    }

    pub fn get_pushes_accepted(&self) -> usize {
        self.pushes_accepted
    }

    pub fn get_pushes_rejected(&self) -> usize {
        self.pushes_rejected
    }

    pub fn merge(&self, other: &Stats) -> Stats {
        Stats {
            rounds: self.rounds + other.rounds,
            edges_visited: self.edges_visited + other.edges_visited,
            pushes_accepted: self.pushes_accepted + other.pushes_accepted,
            pushes_rejected: self.pushes_rejected + other.pushes_rejected,
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats::new()
    }
}
