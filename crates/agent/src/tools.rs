use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error};

use forecourt_core::catalog::format::{no_match_reply, shortlist_reply};
use forecourt_core::financing::{self, plan};
use forecourt_core::{
    CatalogEngine, FilterExtractor, KnowledgeBase, SelectionResolver, SessionStore,
};

/// Emitted whenever a capability hits an unexpected internal failure. The
/// failure itself is logged with full context; the customer only ever sees
/// this.
pub const APOLOGY_REPLY: &str =
    "Lo siento, ocurrió un error procesando tu consulta. ¿Podrías intentar de nuevo?";

/// One text-in/text-out capability, implicitly scoped to a customer id.
/// Implementations must return a reply unconditionally.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &'static str;
    async fn invoke(&self, customer_id: &str, text: &str) -> String;
}

#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn register<C>(&mut self, capability: C)
    where
        C: Capability + 'static,
    {
        self.capabilities.insert(capability.name().to_string(), Arc::new(capability));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.capabilities.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

/// Converts an internal failure into the apologetic reply at the capability
/// boundary. Nothing propagates to the orchestration layer.
fn into_reply(capability: &str, customer_id: &str, result: Result<String>) -> String {
    match result {
        Ok(reply) => reply,
        Err(failure) => {
            error!(
                event_name = "capability.internal_failure",
                capability = capability,
                customer_id = %customer_id,
                error = %failure,
                "capability failed; returning generic apology"
            );
            APOLOGY_REPLY.to_string()
        }
    }
}

/// Drives FilterExtractor → CatalogEngine → SelectionResolver and records
/// the outcome in the customer's session.
pub struct SearchCatalogCapability {
    engine: Arc<CatalogEngine>,
    sessions: Arc<SessionStore>,
}

impl SearchCatalogCapability {
    pub fn new(engine: Arc<CatalogEngine>, sessions: Arc<SessionStore>) -> Self {
        Self { engine, sessions }
    }

    fn run(&self, customer_id: &str, text: &str) -> Result<String> {
        let (filter, detections) = FilterExtractor::new(self.engine.dataset()).extract(text);
        debug!(
            event_name = "capability.search.filter_extracted",
            customer_id = %customer_id,
            detections = ?detections,
            "derived search filter"
        );

        let results = self.engine.search(&filter);
        let reply = if results.is_empty() {
            no_match_reply(&self.engine.dataset().top_makes(3))
        } else {
            shortlist_reply(&results)
        };

        let selected = SelectionResolver::resolve(text, &results);
        self.sessions.with_session(customer_id, |session| {
            session.set_search_filter(filter);
            if let Some(vehicle) = selected {
                session.select_vehicle(Some(vehicle));
            }
            session.record_exchange(text, &reply, "catalog");
        });

        Ok(reply)
    }
}

#[async_trait]
impl Capability for SearchCatalogCapability {
    fn name(&self) -> &'static str {
        "search_catalog"
    }

    async fn invoke(&self, customer_id: &str, text: &str) -> String {
        into_reply(self.name(), customer_id, self.run(customer_id, text))
    }
}

/// Delegates company-information questions to the knowledge base and records
/// the query.
pub struct CompanyInfoCapability {
    knowledge: Arc<dyn KnowledgeBase>,
    sessions: Arc<SessionStore>,
}

impl CompanyInfoCapability {
    pub fn new(knowledge: Arc<dyn KnowledgeBase>, sessions: Arc<SessionStore>) -> Self {
        Self { knowledge, sessions }
    }

    fn run(&self, customer_id: &str, text: &str) -> Result<String> {
        let reply = self.knowledge.lookup(text);
        self.sessions.with_session(customer_id, |session| {
            session.record_exchange(text, &reply, "company_info");
        });
        Ok(reply)
    }
}

#[async_trait]
impl Capability for CompanyInfoCapability {
    fn name(&self) -> &'static str {
        "company_info"
    }

    async fn invoke(&self, customer_id: &str, text: &str) -> String {
        into_reply(self.name(), customer_id, self.run(customer_id, text))
    }
}

/// Drives FinancingExtractor → AmortizationCalculator for the currently
/// discussed vehicle. With no selected vehicle the reply is fixed guidance,
/// never an error.
pub struct FinancingQuoteCapability {
    engine: Arc<CatalogEngine>,
    sessions: Arc<SessionStore>,
}

impl FinancingQuoteCapability {
    pub fn new(engine: Arc<CatalogEngine>, sessions: Arc<SessionStore>) -> Self {
        Self { engine, sessions }
    }

    fn run(&self, customer_id: &str, text: &str) -> Result<String> {
        let reply = self.sessions.with_session(customer_id, |session| {
            let Some(vehicle) =
                session.selected_vehicle.clone().filter(|vehicle| vehicle.price > 0.0)
            else {
                let reply = plan::no_vehicle_reply();
                session.record_exchange(text, &reply, "financing");
                return reply;
            };

            // Re-fetch full detail; the in-memory dataset may have been
            // reloaded since the vehicle was selected.
            let vehicle = self.engine.get_by_id(vehicle.stock_id).unwrap_or(vehicle);

            let down_payment = financing::extract_down_payment(text, vehicle.price);
            let term_years = financing::extract_term_years(text);

            let reply = match (down_payment, term_years) {
                (Some(down_payment), Some(term_years)) => {
                    let amount_financed = vehicle.price - down_payment;
                    let monthly = financing::monthly_payment(amount_financed, term_years);
                    session.set_financing(
                        down_payment,
                        Some(term_years),
                        Some(monthly),
                        amount_financed,
                    );
                    plan::specific_plan(&vehicle, down_payment, term_years)
                }
                (Some(down_payment), None) => {
                    let amount_financed = vehicle.price - down_payment;
                    session.set_financing(down_payment, None, None, amount_financed);
                    plan::multi_term_plan(&vehicle, down_payment)
                }
                (None, _) => plan::option_grid(&vehicle),
            };

            session.record_exchange(text, &reply, "financing");
            reply
        });

        Ok(reply)
    }
}

#[async_trait]
impl Capability for FinancingQuoteCapability {
    fn name(&self) -> &'static str {
        "financing_quote"
    }

    async fn invoke(&self, customer_id: &str, text: &str) -> String {
        into_reply(self.name(), customer_id, self.run(customer_id, text))
    }
}
