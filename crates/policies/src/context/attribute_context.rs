//! The per-request attribute context (`spec.md` §3, §4.B).

use std::collections::HashMap;
use std::sync::Arc;

use crate::context::clock::Clock;
use crate::context::provider::{AttributeProvider, ProviderContext};
use crate::datatype::{Bag, Datatype};
use crate::decision::{MissingAttributeDetail, Status};

/// Key for the provider-result cache: a provider lookup is re-askable by
/// the same (category, attributeId, datatype, issuer) tuple within one
/// request, and `spec.md` §4.B step 2 requires the first answer — bag or
/// Indeterminate alike — to stick.
type ProviderCacheKey = (String, String, Datatype, Option<String>);

/// The four standard XACML 3.0 attribute category URIs. Custom categories
/// are just other strings; these are the well-known ones request/policy
/// authors use most often.
pub mod category {
    pub const SUBJECT: &str = "urn:oasis:names:tc:xacml:1.0:subject-category:access-subject";
    pub const RESOURCE: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:resource";
    pub const ACTION: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:action";
    pub const ENVIRONMENT: &str = "urn:oasis:names:tc:xacml:3.0:attribute-category:environment";
}

/// One `Attribute` value as supplied in a [`crate::pdp::DecisionRequest`]
/// (`spec.md` §3, §6).
#[derive(Debug, Clone)]
pub struct RequestAttribute {
    pub category: String,
    pub attribute_id: String,
    pub datatype: Datatype,
    pub issuer: Option<String>,
    pub value: crate::datatype::Value,
}

/// A single `get()` call, recorded when `return_used_attributes` is set
/// (the `DecisionTrace` supplemental feature — `SPEC_FULL.md` §2).
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub category: String,
    pub attribute_id: String,
    pub datatype: Datatype,
    pub issuer: Option<String>,
    pub resolved: bool,
    pub from_provider: bool,
}

/// The single source of truth for attribute lookups during one decision:
/// request attributes, the provider chain, and the frozen clock
/// (`spec.md` §4.B, §5).
pub struct AttributeContext {
    request: Vec<RequestAttribute>,
    providers: Vec<Arc<dyn AttributeProvider>>,
    clock: Clock,
    record_access: bool,
    access_log: Vec<AccessRecord>,
    matched_policies: Vec<String>,
    provider_cache: HashMap<ProviderCacheKey, Result<Bag, Status>>,
}

impl AttributeContext {
    pub fn new(
        request: Vec<RequestAttribute>,
        providers: Vec<Arc<dyn AttributeProvider>>,
        clock: Clock,
        record_access: bool,
    ) -> Self {
        AttributeContext {
            request,
            providers,
            clock,
            record_access,
            access_log: Vec::new(),
            matched_policies: Vec::new(),
            provider_cache: HashMap::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn access_log(&self) -> &[AccessRecord] {
        &self.access_log
    }

    /// Record that a policy/policy-set's target matched the request,
    /// gated behind `return_used_attributes` alongside the attribute access
    /// log (`spec.md` §4.I step 4, §6 "list of policies that matched").
    pub fn record_matched_policy(&mut self, id: &str) {
        if self.record_access {
            self.matched_policies.push(id.to_string());
        }
    }

    pub fn matched_policies(&self) -> &[String] {
        &self.matched_policies
    }

    /// Resolve a designator: all request/provider values for this
    /// category/id/datatype(/issuer), per `spec.md` §4.B.
    ///
    /// A designator with no `issuer` matches request attributes regardless
    /// of their issuer; a designator *with* an issuer only matches request
    /// attributes whose issuer is exactly that string. An empty result is
    /// promoted to `missing-attribute` only if `must_be_present` is set —
    /// otherwise it is a legitimate empty bag (`spec.md` §4.C bag
    /// semantics).
    #[tracing::instrument(skip(self), fields(category, attribute_id, datatype = %datatype))]
    pub fn get(
        &mut self,
        category: &str,
        attribute_id: &str,
        datatype: Datatype,
        issuer: Option<&str>,
        must_be_present: bool,
    ) -> Result<Bag, Status> {
        let mut from_provider = false;
        let mut values: Vec<_> = self
            .request
            .iter()
            .filter(|a| {
                a.category == category
                    && a.attribute_id == attribute_id
                    && a.datatype == datatype
                    && match issuer {
                        Some(want) => a.issuer.as_deref() == Some(want),
                        None => true,
                    }
            })
            .map(|a| a.value.clone())
            .collect();

        if values.is_empty() {
            let cache_key: ProviderCacheKey =
                (category.to_string(), attribute_id.to_string(), datatype, issuer.map(str::to_string));
            let cached = if let Some(cached) = self.provider_cache.get(&cache_key) {
                Some(cached.clone())
            } else if let Some(provider) =
                self.providers.iter().find(|p| p.supports(category, attribute_id, datatype))
            {
                let provider_ctx = ProviderContext { request: &self.request, clock: &self.clock };
                let found = provider.find(category, attribute_id, datatype, issuer, &provider_ctx);
                self.provider_cache.insert(cache_key, found.clone());
                Some(found)
            } else {
                None
            };
            match cached {
                Some(Ok(bag)) => {
                    from_provider = true;
                    values = bag.into_values();
                }
                Some(Err(status)) => {
                    if self.record_access {
                        self.access_log.push(AccessRecord {
                            category: category.to_string(),
                            attribute_id: attribute_id.to_string(),
                            datatype,
                            issuer: issuer.map(str::to_string),
                            resolved: false,
                            from_provider: true,
                        });
                    }
                    return Err(status);
                }
                None => {}
            }
        }

        let resolved = !values.is_empty();
        if self.record_access {
            self.access_log.push(AccessRecord {
                category: category.to_string(),
                attribute_id: attribute_id.to_string(),
                datatype,
                issuer: issuer.map(str::to_string),
                resolved,
                from_provider,
            });
        }

        if !resolved && must_be_present {
            tracing::debug!("mandatory attribute not found");
            return Err(Status::missing_attribute(MissingAttributeDetail {
                category: category.to_string(),
                attribute_id: attribute_id.to_string(),
                datatype,
                issuer: issuer.map(str::to_string),
            }));
        }

        Ok(Bag::new(datatype, values).expect("request/provider values were already datatype-checked"))
    }
}
