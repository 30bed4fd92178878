/// Generation of particles whose ancestry cannot be traced to the root
pub const UNKNOWN_GENERATION: u32 = 1_000_000_000;

/// Ancestry depth of a particle
///
/// `parent` is the parent ID of the particle itself. The result is 1
/// if `is_root(parent)`, otherwise one more than the generation of
/// the parent, whose own parent is obtained with `parent_of`.
/// `parent_of` returns `None` if a particle is unknown or has no
/// parent.
///
/// The walk gives up after `max_hops` steps and returns
/// [UNKNOWN_GENERATION], as it does for chains that end before
/// reaching the root. Passing the number of known particles as
/// `max_hops` is enough to catch all cycles.
pub fn generation<T, R, P>(
    parent: Option<T>,
    mut is_root: R,
    mut parent_of: P,
    max_hops: usize,
) -> u32
where
    T: Copy,
    R: FnMut(T) -> bool,
    P: FnMut(T) -> Option<T>,
{
    let mut current = parent;
    let mut depth = 1;
    for _ in 0..=max_hops {
        let Some(id) = current else {
            return UNKNOWN_GENERATION;
        };
        if is_root(id) {
            return depth;
        }
        current = parent_of(id);
        depth += 1;
    }
    UNKNOWN_GENERATION
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    // child -> parent, rooted at 0
    fn tree() -> HashMap<usize, usize> {
        HashMap::from([(1, 0), (2, 0), (3, 1), (4, 3), (5, 4), (7, 6)])
    }

    fn gen_of(id: usize, tree: &HashMap<usize, usize>) -> u32 {
        generation(
            tree.get(&id).copied(),
            |p| p == 0,
            |p| tree.get(&p).copied(),
            tree.len(),
        )
    }

    #[test]
    fn direct_daughters() {
        let tree = tree();
        assert_eq!(gen_of(1, &tree), 1);
        assert_eq!(gen_of(2, &tree), 1);
    }

    #[test]
    fn one_per_hop() {
        let tree = tree();
        assert_eq!(gen_of(3, &tree), 2);
        assert_eq!(gen_of(4, &tree), 3);
        assert_eq!(gen_of(5, &tree), 4);
    }

    #[test]
    fn broken_chain() {
        let tree = tree();
        // 6 is not known
        assert_eq!(gen_of(7, &tree), UNKNOWN_GENERATION);
        // no parent at all
        assert_eq!(gen_of(0, &tree), UNKNOWN_GENERATION);
        assert_eq!(gen_of(42, &tree), UNKNOWN_GENERATION);
    }

    #[test]
    fn cycle() {
        let tree = HashMap::from([(1, 2), (2, 3), (3, 1)]);
        assert_eq!(gen_of(1, &tree), UNKNOWN_GENERATION);
    }

    #[test]
    fn hop_limit() {
        let tree = tree();
        let depth = generation(
            tree.get(&5).copied(),
            |p| p == 0,
            |p| tree.get(&p).copied(),
            2,
        );
        assert_eq!(depth, UNKNOWN_GENERATION);
        let depth = generation(
            tree.get(&5).copied(),
            |p| p == 0,
            |p| tree.get(&p).copied(),
            3,
        );
        assert_eq!(depth, 4);
    }
}
