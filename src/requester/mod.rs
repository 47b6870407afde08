//! Request descriptors.
//!
//! An [`EventRequester`] binds a fetch target (the local store or one remote
//! endpoint) to the selectors that produce foreign ids for it. Every
//! construction style lands in the same `{single, list}` shape, so the
//! engine never branches on how a requester was built.

use std::fmt;

use crate::config::HydrationConfig;
use crate::error::{HydrationError, Result};
use crate::interfaces::Projection;
use crate::selector::{flatten, Arity, ForeignIdSelector, ResolvedSelector};

/// Where a requester's foreign ids are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The local event store.
    Local,
    /// Batch event endpoint of another service.
    Remote(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local => f.write_str("local"),
            Target::Remote(endpoint) => f.write_str(endpoint),
        }
    }
}

/// Selectors for one projection type, bound to one target.
pub struct EventRequester<P> {
    target: Target,
    single_selectors: Vec<ForeignIdSelector<P>>,
    list_selectors: Vec<ForeignIdSelector<P>>,
}

impl<P> Clone for EventRequester<P> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            single_selectors: self.single_selectors.clone(),
            list_selectors: self.list_selectors.clone(),
        }
    }
}

impl<P> fmt::Debug for EventRequester<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRequester")
            .field("target", &self.target)
            .field("single_selectors", &self.single_selectors.len())
            .field("list_selectors", &self.list_selectors.len())
            .finish()
    }
}

impl<P: Projection> EventRequester<P> {
    /// Requester that reads from the local event store.
    pub fn local() -> Self {
        Self {
            target: Target::Local,
            single_selectors: Vec::new(),
            list_selectors: Vec::new(),
        }
    }

    /// Requester that calls the batch endpoint at `endpoint`.
    ///
    /// Fails when the endpoint is empty.
    pub fn remote(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(HydrationError::configuration(
                "remote requester needs a non-empty endpoint",
            ));
        }
        Ok(Self {
            target: Target::Remote(endpoint.to_string()),
            single_selectors: Vec::new(),
            list_selectors: Vec::new(),
        })
    }

    /// Requester for a remote service declared in configuration.
    pub fn remote_named(config: &HydrationConfig, name: &str) -> Result<Self> {
        let url = config
            .remote_url(name)
            .map_err(|e| HydrationError::configuration(e.to_string()))?;
        Self::remote(url)
    }

    /// Add an optional single-id selector.
    pub fn single<F>(self, select: F) -> Self
    where
        F: Fn(&P) -> Option<uuid::Uuid> + Send + Sync + 'static,
    {
        self.selector(ForeignIdSelector::single(select))
    }

    /// Add a single-id selector for a field that is always set.
    pub fn required_single<F>(self, select: F) -> Self
    where
        F: Fn(&P) -> uuid::Uuid + Send + Sync + 'static,
    {
        self.selector(ForeignIdSelector::required(select))
    }

    /// Add a list selector over optional ids.
    pub fn list<F, I>(self, select: F) -> Self
    where
        F: Fn(&P) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = Option<uuid::Uuid>>,
    {
        self.selector(ForeignIdSelector::list(select))
    }

    /// Add a list selector over ids that are always set.
    pub fn required_list<F, I>(self, select: F) -> Self
    where
        F: Fn(&P) -> I + Send + Sync + 'static,
        I: IntoIterator<Item = uuid::Uuid>,
    {
        self.selector(ForeignIdSelector::required_list(select))
    }

    /// Add a prebuilt selector, routed by its arity.
    pub fn selector(mut self, selector: ForeignIdSelector<P>) -> Self {
        match selector.arity() {
            Arity::Single => self.single_selectors.push(selector),
            Arity::List => self.list_selectors.push(selector),
        }
        self
    }

    /// Add selector groups in bulk. `None` means none of that kind.
    ///
    /// Each selector is routed by its own arity, whichever group it came in.
    pub fn with_selectors(
        self,
        single_selectors: Option<Vec<ForeignIdSelector<P>>>,
        list_selectors: Option<Vec<ForeignIdSelector<P>>>,
    ) -> Self {
        single_selectors
            .into_iter()
            .chain(list_selectors)
            .flatten()
            .fold(self, Self::selector)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn single_selectors(&self) -> &[ForeignIdSelector<P>] {
        &self.single_selectors
    }

    pub fn list_selectors(&self) -> &[ForeignIdSelector<P>] {
        &self.list_selectors
    }

    pub fn is_empty(&self) -> bool {
        self.single_selectors.is_empty() && self.list_selectors.is_empty()
    }

    /// Normal-form selectors for a batch.
    ///
    /// Single selectors come first in registration order, followed by the
    /// flattened list selectors in list-registration order.
    pub fn all_selectors(&self, projections: &[P]) -> Vec<ResolvedSelector<P>> {
        self.single_selectors
            .iter()
            .cloned()
            .map(ResolvedSelector::Shared)
            .chain(flatten(projections, &self.list_selectors))
            .collect()
    }
}

#[cfg(test)]
mod tests;
