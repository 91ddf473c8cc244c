/// Calls `f` on each permutation of `items`, stopping at the first error.
///
/// It uses the iterative version of [Heap's algorithm](https://en.wikipedia.org/wiki/Heap%27s_algorithm):
/// each permutation is produced in place by a single swap and exactly once.
/// The first call is on `items` in its original order.
pub fn for_each_permutation<T, E>(
    items: &mut [T],
    mut f: impl FnMut(&[T]) -> Result<(), E>,
) -> Result<(), E> {
    f(items)?;
    let mut counters = vec![0; items.len()];
    let mut i = 1;
    while i < items.len() {
        if counters[i] < i {
            if i % 2 == 0 {
                items.swap(0, i);
            } else {
                items.swap(counters[i], i);
            }
            f(items)?;
            counters[i] += 1;
            i = 1;
        } else {
            counters[i] = 0;
            i += 1;
        }
    }
    Ok(())
}

/// Number of permutations of `n` items, `None` on overflow.
pub(crate) fn permutation_count(n: usize) -> Option<usize> {
    (2..=n).try_fold(1_usize, usize::checked_mul)
}
