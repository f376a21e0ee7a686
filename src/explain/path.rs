//! Weighted path state for the TreeSHAP recursion.
//!
//! Tracks the features encountered on a root-to-leaf walk together with
//! the fraction of background paths (`zero_fraction`) and instance paths
//! (`one_fraction`) that flow through each, plus the permutation weights
//! (`pweight`) of each subset size. See Lundberg et al. (2020), Algorithm 2.

/// One entry on the unique-feature path.
#[derive(Clone, Copy, Debug)]
pub struct PathElement {
    /// Feature index, -1 for the root sentinel.
    pub feature: i32,
    /// Fraction of background (cover-weighted) paths through this split.
    pub zero_fraction: f64,
    /// Fraction of instance paths through this split (1 or 0).
    pub one_fraction: f64,
    /// Permutation weight for the subset size at this position.
    pub pweight: f64,
}

/// The unique-feature path maintained during tree traversal.
///
/// Cloned at each branch of the recursion; depth is bounded by the tree
/// height, so clones stay small.
#[derive(Clone, Debug)]
pub struct PathState {
    elements: Vec<PathElement>,
}

impl PathState {
    /// Create an empty path with capacity for `max_depth` extensions.
    pub fn new(max_depth: usize) -> Self {
        Self {
            elements: Vec::with_capacity(max_depth + 2),
        }
    }

    /// Number of elements on the path (including the root sentinel).
    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the path is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element at `index`.
    #[inline]
    pub fn element(&self, index: usize) -> &PathElement {
        &self.elements[index]
    }

    /// Position of `feature` on the path, if present.
    pub fn find(&self, feature: i32) -> Option<usize> {
        self.elements.iter().position(|e| e.feature == feature)
    }

    /// Grow the path by one split, updating all permutation weights.
    pub fn extend(&mut self, zero_fraction: f64, one_fraction: f64, feature: i32) {
        let d = self.elements.len();
        self.elements.push(PathElement {
            feature,
            zero_fraction,
            one_fraction,
            pweight: if d == 0 { 1.0 } else { 0.0 },
        });
        let denom = (d + 1) as f64;
        for i in (0..d).rev() {
            self.elements[i + 1].pweight +=
                one_fraction * self.elements[i].pweight * (i + 1) as f64 / denom;
            self.elements[i].pweight =
                zero_fraction * self.elements[i].pweight * (d - i) as f64 / denom;
        }
    }

    /// Remove the element at `path_index`, restoring the weights the path
    /// would have had without it. Inverse of [`extend`](Self::extend).
    pub fn unwind(&mut self, path_index: usize) {
        let ud = self.elements.len() - 1;
        let one_fraction = self.elements[path_index].one_fraction;
        let zero_fraction = self.elements[path_index].zero_fraction;
        let mut next_one_portion = self.elements[ud].pweight;

        for i in (0..ud).rev() {
            if one_fraction != 0.0 {
                let tmp = self.elements[i].pweight;
                self.elements[i].pweight =
                    next_one_portion * (ud + 1) as f64 / ((i + 1) as f64 * one_fraction);
                next_one_portion = tmp
                    - self.elements[i].pweight * zero_fraction * (ud - i) as f64
                        / (ud + 1) as f64;
            } else {
                self.elements[i].pweight = self.elements[i].pweight * (ud + 1) as f64
                    / (zero_fraction * (ud - i) as f64);
            }
        }
        for i in path_index..ud {
            self.elements[i].feature = self.elements[i + 1].feature;
            self.elements[i].zero_fraction = self.elements[i + 1].zero_fraction;
            self.elements[i].one_fraction = self.elements[i + 1].one_fraction;
        }
        self.elements.pop();
    }

    /// Total permutation weight the path would carry if the element at
    /// `path_index` were unwound, without mutating the path.
    pub fn unwound_sum(&self, path_index: usize) -> f64 {
        let ud = self.elements.len() - 1;
        let one_fraction = self.elements[path_index].one_fraction;
        let zero_fraction = self.elements[path_index].zero_fraction;
        let mut next_one_portion = self.elements[ud].pweight;
        let mut total = 0.0;

        for i in (0..ud).rev() {
            if one_fraction != 0.0 {
                let tmp = next_one_portion * (ud + 1) as f64 / ((i + 1) as f64 * one_fraction);
                total += tmp;
                next_one_portion = self.elements[i].pweight
                    - tmp * zero_fraction * (ud - i) as f64 / (ud + 1) as f64;
            } else if zero_fraction != 0.0 {
                total +=
                    (self.elements[i].pweight / zero_fraction) / ((ud - i) as f64 / (ud + 1) as f64);
            }
        }
        total
    }
}
