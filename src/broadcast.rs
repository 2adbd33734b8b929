//! Multichannel parameter expansion.
//!
//! A control object accepts each constructor argument as a scalar or a
//! per-channel list. Expansion aligns a heterogeneous set of those into a
//! single channel count: the longest list wins, and shorter lists repeat
//! cyclically rather than erroring. Everything here is stateless and
//! deterministic.

use crate::{param::Params, Error, Result};

/// Channel count implied by a set of parameter lists: the maximum length
/// among them. All-scalar inputs give 1.
///
/// An empty list cannot broadcast and is rejected here, which makes this
/// the single validation point for every constructor and setter.
pub fn expand(lists: &[&Params]) -> Result<usize> {
    let mut lmax = 1;
    for list in lists {
        if list.is_empty() {
            return Err(Error::EmptyParams);
        }
        lmax = lmax.max(list.len());
    }
    Ok(lmax)
}

/// Cyclic indexing: `seq[i mod len]`. A one-element sequence broadcasts its
/// value to every channel; a shorter sequence repeats.
#[inline]
pub fn wrap<T>(seq: &[T], i: usize) -> &T {
    debug_assert!(!seq.is_empty());
    &seq[i % seq.len()]
}
