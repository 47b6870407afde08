//! Foreign-id selectors.
//!
//! A selector pulls foreign aggregate ids out of a projection. Every
//! constructor style normalizes into one canonical form, `&P -> Vec<Option<Uuid>>`,
//! where a single-valued selector yields at most one element.
//!
//! List selectors are not queried directly. [`flatten`] turns them into
//! [`ResolvedSelector::Attributed`] entries, one per non-absent element, each
//! owned by the projection that produced it. That lets a heterogeneous batch
//! be queried in one round while every fetched event stays attributable.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::interfaces::Projection;

type ExtractFn<P> = dyn Fn(&P) -> Vec<Option<Uuid>> + Send + Sync;

/// Arity a selector was declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Single,
    List,
}

/// A pure function extracting foreign ids from a projection.
pub struct ForeignIdSelector<P> {
    arity: Arity,
    extract: Arc<ExtractFn<P>>,
}

impl<P> Clone for ForeignIdSelector<P> {
    fn clone(&self) -> Self {
        Self {
            arity: self.arity,
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<P> fmt::Debug for ForeignIdSelector<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignIdSelector")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

impl<P: 'static> ForeignIdSelector<P> {
    /// Selector for an optional single id field.
    pub fn single<F>(select: F) -> Self
    where
        F: Fn(&P) -> Option<Uuid> + Send + Sync + 'static,
    {
        Self {
            arity: Arity::Single,
            extract: Arc::new(move |p| vec![select(p)]),
        }
    }

    /// Selector for a single id field that is always populated.
    pub fn required<F>(select: F) -> Self
    where
        F: Fn(&P) -> Uuid + Send + Sync + 'static,
    {
        Self {
            arity: Arity::Single,
            extract: Arc::new(move |p| vec![Some(select(p))]),
        }
    }

    /// Selector for a list of optional ids.
    ///
    /// An absent list can be expressed as an empty iterator.
    pub fn list<F, I>(select: F) -> Self
    where
        F: Fn(&P) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Option<Uuid>>,
    {
        Self {
            arity: Arity::List,
            extract: Arc::new(move |p| select(p).into_iter().collect()),
        }
    }

    /// Selector for a list of ids that are always populated.
    pub fn required_list<F, I>(select: F) -> Self
    where
        F: Fn(&P) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Uuid>,
    {
        Self {
            arity: Arity::List,
            extract: Arc::new(move |p| select(p).into_iter().map(Some).collect()),
        }
    }
}

impl<P> ForeignIdSelector<P> {
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Evaluate in canonical form.
    pub fn evaluate(&self, projection: &P) -> Vec<Option<Uuid>> {
        (self.extract)(projection)
    }

    /// Evaluate as a single-valued selector: the first element, if any.
    pub fn evaluate_single(&self, projection: &P) -> Option<Uuid> {
        self.evaluate(projection).into_iter().next().flatten()
    }
}

/// A single-valued selector in normal form.
pub enum ResolvedSelector<P> {
    /// A single selector, evaluated against whichever projection is asked.
    Shared(ForeignIdSelector<P>),
    /// One element of a list selector, non-absent only for its owner.
    Attributed { owner: Uuid, id: Uuid },
}

impl<P> Clone for ResolvedSelector<P> {
    fn clone(&self) -> Self {
        match self {
            ResolvedSelector::Shared(selector) => ResolvedSelector::Shared(selector.clone()),
            ResolvedSelector::Attributed { owner, id } => ResolvedSelector::Attributed {
                owner: *owner,
                id: *id,
            },
        }
    }
}

impl<P> fmt::Debug for ResolvedSelector<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedSelector::Shared(selector) => f.debug_tuple("Shared").field(selector).finish(),
            ResolvedSelector::Attributed { owner, id } => f
                .debug_struct("Attributed")
                .field("owner", owner)
                .field("id", id)
                .finish(),
        }
    }
}

impl<P: Projection> ResolvedSelector<P> {
    /// Foreign id this selector yields for `projection`.
    pub fn select(&self, projection: &P) -> Option<Uuid> {
        match self {
            ResolvedSelector::Shared(selector) => selector.evaluate_single(projection),
            ResolvedSelector::Attributed { owner, id } => {
                (projection.projection_id() == *owner).then_some(*id)
            }
        }
    }
}

/// Flatten list selectors into per-projection attributed selectors.
///
/// Every list selector is evaluated once per projection and each non-absent
/// element becomes one [`ResolvedSelector::Attributed`]. Absent elements
/// and empty lists yield nothing. Duplicates are kept; deduplication
/// happens at fetch time.
pub fn flatten<P: Projection>(
    projections: &[P],
    list_selectors: &[ForeignIdSelector<P>],
) -> Vec<ResolvedSelector<P>> {
    let mut flattened = Vec::new();
    for selector in list_selectors {
        for projection in projections {
            let owner = projection.projection_id();
            flattened.extend(
                selector
                    .evaluate(projection)
                    .into_iter()
                    .flatten()
                    .map(|id| ResolvedSelector::Attributed { owner, id }),
            );
        }
    }
    flattened
}
