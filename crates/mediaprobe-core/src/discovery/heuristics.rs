/// Early-abort rules that keep a discovery run bounded.
///
/// The goal is "enough pictures for a preview grid", not an exhaustive
/// listing, so each rule trades completeness for less work.

/// Stop inspecting the remaining entries of a folder once it has yielded
/// `cap` qualifying files. The root is exempt, and a `cap` of 0 disables the
/// rule.
#[inline]
pub fn level_is_full(depth: usize, found: usize, cap: usize) -> bool {
    depth > 0 && cap > 0 && found == cap
}

/// Descend into sub-folders only if there are any and either this is the
/// root or this folder had no pictures of its own.
#[inline]
pub fn should_descend(depth: usize, candidates: usize, found: usize) -> bool {
    candidates > 0 && (depth == 0 || found == 0)
}

/// After searching one sub-folder at `child_depth`, skip its remaining
/// siblings if it was two or more levels deep and produced pictures.
#[inline]
pub fn should_abort_sibling_descent(child_depth: usize, found_in_child: usize) -> bool {
    child_depth > 1 && found_in_child > 0
}
