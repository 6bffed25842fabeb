//! Pairwise precedence tally and majority ranking.
//!
//! The tally lives for exactly one extraction call. Resources are interned in
//! first-seen order, and that interned index doubles as the tie-break key when
//! ranking.

use crate::resource::Resource;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

/// Precedence votes collected from successful captures.
#[derive(Debug, Default)]
pub struct VoteTally {
    index: HashMap<String, usize>,
    resources: Vec<Resource>,
    votes: HashMap<(usize, usize), u32>,
    runs: usize,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one non-empty capture into the tally.
    ///
    /// Repeated urls within the capture count at their first position only.
    /// Returns the set of interned indices seen in this capture.
    pub fn record(&mut self, sequence: &[Resource]) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut ordered = Vec::with_capacity(sequence.len());
        for resource in sequence {
            let idx = self.intern(resource);
            if seen.insert(idx) {
                ordered.push(idx);
            }
        }

        for (i, &earlier) in ordered.iter().enumerate() {
            for &later in &ordered[i + 1..] {
                *self.votes.entry((earlier, later)).or_insert(0) += 1;
            }
        }
        self.runs += 1;
        seen
    }

    fn intern(&mut self, resource: &Resource) -> usize {
        if let Some(&idx) = self.index.get(resource.url()) {
            return idx;
        }
        let idx = self.resources.len();
        self.index.insert(resource.url().to_string(), idx);
        self.resources.push(resource.clone());
        idx
    }

    /// Number of captures folded in so far.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// How many captures saw `a` strictly before `b`.
    pub fn votes(&self, a: usize, b: usize) -> u32 {
        self.votes.get(&(a, b)).copied().unwrap_or(0)
    }

    /// Interned index of a url, if it was ever seen.
    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.index.get(url).copied()
    }

    /// First-seen instance of an interned resource.
    pub fn resource(&self, idx: usize) -> &Resource {
        &self.resources[idx]
    }

    /// Majority comparator: `a` precedes `b` when its vote margin over `b`
    /// exceeds half the number of successful runs.
    ///
    /// This relation is not guaranteed to be transitive.
    pub fn precedes(&self, a: usize, b: usize) -> bool {
        let margin = i64::from(self.votes(a, b)) - i64::from(self.votes(b, a));
        2 * margin > self.runs as i64
    }

    /// Rank a set of interned indices.
    ///
    /// Majority edges are ordered topologically, always taking the earliest
    /// first-seen candidate among those with no unplaced predecessor. When a
    /// vote cycle leaves no such candidate, the unplaced candidate that beats
    /// the most other unplaced candidates goes next, first-seen order breaking
    /// ties. Any order consistent with every majority is therefore kept.
    pub fn rank(&self, candidates: &BTreeSet<usize>) -> Vec<usize> {
        let nodes: Vec<usize> = candidates.iter().copied().collect();
        let n = nodes.len();
        let successors: Vec<Vec<usize>> = (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i && self.precedes(nodes[i], nodes[j]))
                    .collect()
            })
            .collect();

        let mut indegree = vec![0usize; n];
        for targets in &successors {
            for &j in targets {
                indegree[j] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut placed = vec![false; n];
        let mut ranked = Vec::with_capacity(n);
        while let Some(next) = ready
            .pop_first()
            .or_else(|| Self::break_cycle(&successors, &placed))
        {
            placed[next] = true;
            ranked.push(nodes[next]);
            for &j in &successors[next] {
                if placed[j] {
                    continue;
                }
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    ready.insert(j);
                }
            }
        }
        ranked
    }

    /// Unplaced position with the most wins over other unplaced positions.
    fn break_cycle(successors: &[Vec<usize>], placed: &[bool]) -> Option<usize> {
        (0..successors.len())
            .filter(|&i| !placed[i])
            .min_by_key(|&i| {
                let wins = successors[i].iter().filter(|&&j| !placed[j]).count();
                (Reverse(wins), i)
            })
    }

    #[cfg(test)]
    fn set_votes(&mut self, a: usize, b: usize, count: u32) {
        self.votes.insert((a, b), count);
    }
}
