use std::sync::Arc;

use tracing::{info, warn};

use forecourt_core::{CatalogEngine, KnowledgeBase, SessionStore};

use crate::tools::{
    CapabilityRegistry, CompanyInfoCapability, FinancingQuoteCapability, SearchCatalogCapability,
};

const FINANCING_CUES: &[&str] = &[
    "enganche",
    "financiamiento",
    "financiar",
    "mensualidad",
    "mensualidades",
    "plazo",
    "crédito",
    "credito",
    "down payment",
    "financing",
    "monthly payment",
];

const COMPANY_CUES: &[&str] = &[
    "garantía",
    "garantia",
    "sede",
    "sedes",
    "sucursal",
    "empresa",
    "quienes",
    "quiénes",
    "devolución",
    "devolucion",
    "certific",
    "trámite",
    "tramite",
    "horario",
    "videollamada",
    "vender mi",
    "cotizar",
    "warranty",
];

pub struct AgentRuntime {
    registry: CapabilityRegistry,
}

impl AgentRuntime {
    pub fn new(registry: CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Standard wiring: the three capabilities over a shared catalog engine,
    /// session store, and knowledge base.
    pub fn with_defaults(
        engine: Arc<CatalogEngine>,
        sessions: Arc<SessionStore>,
        knowledge: Arc<dyn KnowledgeBase>,
    ) -> Self {
        let mut registry = CapabilityRegistry::default();
        registry.register(SearchCatalogCapability::new(Arc::clone(&engine), Arc::clone(&sessions)));
        registry.register(CompanyInfoCapability::new(knowledge, Arc::clone(&sessions)));
        registry.register(FinancingQuoteCapability::new(engine, sessions));
        Self::new(registry)
    }

    pub fn capability_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Invokes one capability by name. Unknown names get guidance rather
    /// than an error; capabilities themselves never raise past their
    /// boundary, so this always returns text.
    pub async fn dispatch(&self, capability: &str, customer_id: &str, text: &str) -> String {
        let Some(tool) = self.registry.get(capability) else {
            warn!(
                event_name = "runtime.unknown_capability",
                capability = capability,
                customer_id = %customer_id,
                "dispatch requested for unknown capability"
            );
            return format!(
                "No tengo la herramienta `{capability}`. Capacidades disponibles: {}.",
                self.registry.names().join(", ")
            );
        };

        info!(
            event_name = "runtime.capability_dispatched",
            capability = capability,
            customer_id = %customer_id,
            "dispatching capability"
        );
        tool.invoke(customer_id, text).await
    }

    /// Thin keyword stand-in for the external orchestration layer: financing
    /// cues beat company cues, and everything else is a catalog search.
    pub fn route(text: &str) -> &'static str {
        let normalized = text.to_lowercase();
        if FINANCING_CUES.iter().any(|cue| normalized.contains(cue)) {
            return "financing_quote";
        }
        if COMPANY_CUES.iter().any(|cue| normalized.contains(cue)) {
            return "company_info";
        }
        "search_catalog"
    }

    /// One inbound message end to end: route, dispatch, reply.
    pub async fn handle_message(&self, customer_id: &str, text: &str) -> String {
        self.dispatch(Self::route(text), customer_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forecourt_core::{
        CatalogEngine, Dataset, KeywordKnowledgeBase, SessionStore, StockId, VehicleRecord,
    };

    use super::AgentRuntime;

    fn runtime_with_sessions() -> (AgentRuntime, Arc<SessionStore>) {
        let corolla = VehicleRecord {
            stock_id: StockId(1),
            make: "Toyota".to_string(),
            model: "Corolla".to_string(),
            year: 2021,
            price: 300_000.0,
            km: 20_000,
            version: "1.8 LE".to_string(),
            bluetooth: true,
            car_play: false,
            length_mm: 4630.0,
            width_mm: 1780.0,
            height_mm: 1435.0,
        };
        let engine = Arc::new(CatalogEngine::new(Dataset::from_records(vec![corolla])));
        let sessions = Arc::new(SessionStore::new());
        let runtime = AgentRuntime::with_defaults(
            engine,
            Arc::clone(&sessions),
            Arc::new(KeywordKnowledgeBase),
        );
        (runtime, sessions)
    }

    #[test]
    fn routing_prefers_financing_then_company_then_search() {
        assert_eq!(AgentRuntime::route("enganche de 60000 a 4 años"), "financing_quote");
        assert_eq!(AgentRuntime::route("¿qué garantía manejan?"), "company_info");
        assert_eq!(AgentRuntime::route("Toyota con presupuesto de 350000"), "search_catalog");
        // Financing cues win even when company cues are present.
        assert_eq!(AgentRuntime::route("¿el financiamiento incluye garantía?"), "financing_quote");
    }

    #[tokio::test]
    async fn unknown_capability_gets_guidance_instead_of_an_error() {
        let (runtime, _) = runtime_with_sessions();
        let reply = runtime.dispatch("send_rockets", "c1", "hola").await;
        assert!(reply.contains("send_rockets"));
        assert!(reply.contains("search_catalog"));
    }

    #[tokio::test]
    async fn registered_capabilities_are_discoverable() {
        let (runtime, _) = runtime_with_sessions();
        assert_eq!(
            runtime.capability_names(),
            vec!["company_info", "financing_quote", "search_catalog"]
        );
    }

    #[tokio::test]
    async fn a_full_conversation_flows_from_search_to_financing() {
        let (runtime, sessions) = runtime_with_sessions();
        let customer = "5215550009";

        let search_reply = runtime.handle_message(customer, "me interesa el toyota corolla").await;
        assert!(search_reply.contains("Toyota Corolla 2021"));
        sessions.with_session(customer, |session| {
            assert!(session.selected_vehicle.is_some());
        });

        let quote_reply = runtime.handle_message(customer, "enganche de 60000 a 4 años").await;
        assert!(quote_reply.contains("Financiamiento a 4 años"));
        sessions.with_session(customer, |session| {
            assert_eq!(session.down_payment, Some(60_000.0));
            assert_eq!(session.term_years, Some(4));
        });
    }

    #[tokio::test]
    async fn financing_first_conversation_gets_the_guidance_reply() {
        let (runtime, _) = runtime_with_sessions();
        let reply = runtime.handle_message("c9", "quiero un plan de financiamiento").await;
        assert!(reply.contains("primero selecciones un auto"));
    }
}
