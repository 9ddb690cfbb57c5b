use derive_new::new;

/// Number of inserted and deleted elements in an edit script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditStats {
    pub insertions: usize,
    pub deletions: usize,
}

/// Myers' O(ND) shortest edit script between `a` (old) and `b` (new)
///
/// Only the size of the script is computed, so memory stays linear in the
/// input length.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MyersDiff<'d, T> {
    a: &'d [T],
    b: &'d [T],
}

impl<'d, T: Eq> MyersDiff<'d, T> {
    /// Length of the shortest edit script, keeping a single frontier
    fn edit_distance(a: &[T], b: &[T]) -> usize {
        let (n, m) = (a.len() as isize, b.len() as isize);
        let max = n + m;
        let offset = max + 1;

        let mut v = vec![0isize; 2 * offset as usize + 1];

        for d in 0..=max {
            for k in (-d..=d).step_by(2) {
                let idx = (offset + k) as usize;

                // k == -d is only reachable by an insertion, k == d by a deletion
                let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                    v[idx + 1]
                } else {
                    v[idx - 1] + 1
                };

                let mut y = x - k;
                while x < n && y < m && a[x as usize] == b[y as usize] {
                    x += 1;
                    y += 1;
                }

                v[idx] = x;

                if x >= n && y >= m {
                    return d as usize;
                }
            }
        }

        max as usize
    }

    pub fn stats(&self) -> EditStats {
        let prefix = self
            .a
            .iter()
            .zip(self.b)
            .take_while(|(old, new)| old == new)
            .count();
        let (a, b) = (&self.a[prefix..], &self.b[prefix..]);
        let suffix = a
            .iter()
            .rev()
            .zip(b.iter().rev())
            .take_while(|(old, new)| old == new)
            .count();
        let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

        // distance = insertions + deletions and b.len() = a.len() + insertions - deletions
        let distance = Self::edit_distance(a, b);
        let deletions = (distance + a.len() - b.len()) / 2;

        EditStats {
            insertions: distance - deletions,
            deletions,
        }
    }
}
