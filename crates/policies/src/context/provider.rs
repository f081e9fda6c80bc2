//! The attribute provider port (`spec.md` §4.B, §6).

use crate::context::clock::Clock;
use crate::context::attribute_context::RequestAttribute;
use crate::datatype::{Bag, Datatype};
use crate::decision::Status;

/// The read-only request-scoped state a provider may consult while
/// resolving an attribute — the attributes already supplied on the request
/// and the frozen clock (`spec.md` §6: `find(category, attributeId,
/// datatype, issuer?, context)`). This is deliberately not the
/// `AttributeContext` itself: `AttributeContext::get` is already
/// mutably borrowed while a provider runs, so a provider cannot recurse
/// back into `get` through this view — it sees only what's already on
/// hand, not a way to trigger further provider lookups.
pub struct ProviderContext<'a> {
    pub request: &'a [RequestAttribute],
    pub clock: &'a Clock,
}

/// A source of attribute values the [`super::AttributeContext`] consults
/// when an attribute is absent from the request itself — a PIP, a
/// directory lookup, a computed/derived attribute, and so on.
///
/// Deliberately synchronous: `spec.md` §5 states that attribute providers
/// "MAY perform blocking I/O; they are invoked synchronously from within
/// evaluation." Any provider needing to call an async service is
/// responsible for bridging that itself (e.g. `futures::executor::block_on`
/// on its own runtime handle); this crate never awaits anything.
pub trait AttributeProvider: Send + Sync {
    /// Whether this provider can answer for this category/id/datatype.
    /// The context calls `find` on the first provider (in registration
    /// order) for which this returns `true` (`spec.md` §4.B).
    fn supports(&self, category: &str, attribute_id: &str, datatype: Datatype) -> bool;

    /// Resolve a bag of values (possibly empty — an empty bag is not
    /// itself an error; whether it becomes `Indeterminate` is decided by
    /// the designator/selector's `must_be_present` flag) or `Err` if
    /// resolution itself failed (`spec.md` §4.B step 2, §6: `Bag |
    /// Indeterminate`). Only called once `supports` has already said yes,
    /// so there is no "nothing available" case distinct from an empty bag.
    fn find(
        &self,
        category: &str,
        attribute_id: &str,
        datatype: Datatype,
        issuer: Option<&str>,
        context: &ProviderContext,
    ) -> Result<Bag, Status>;
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;

    mockall::mock! {
        pub Provider {}

        impl AttributeProvider for Provider {
            fn supports(&self, category: &str, attribute_id: &str, datatype: Datatype) -> bool;
            fn find(
                &self,
                category: &str,
                attribute_id: &str,
                datatype: Datatype,
                issuer: Option<&str>,
                context: &ProviderContext,
            ) -> Result<Bag, Status>;
        }
    }
}
