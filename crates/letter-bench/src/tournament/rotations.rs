/// Cyclic seatings: in rotation `r` agent `i` sits at seat `(i + r) % seats`,
/// so every agent opens from every seat across a full cycle.
pub struct SeatRotations {
    rotations: Vec<Vec<usize>>,
}

impl SeatRotations {
    pub fn new(seats: usize, count: usize) -> Self {
        let limit = count.min(seats);
        let rotations = (0..limit)
            .map(|shift| (0..seats).map(|seat| (seat + seats - shift) % seats).collect())
            .collect();
        Self { rotations }
    }

    /// Each entry maps seat index to agent index.
    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.rotations
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }
}
