//! Company-information lookup. This is deliberately a keyword-matched table,
//! not a retrieval system: the orchestration layer owns anything smarter and
//! this crate only needs a deterministic seam to delegate to.

/// Seam for the company-information collaborator.
pub trait KnowledgeBase: Send + Sync {
    /// Always answers; unrecognized queries fall back to the general section.
    fn lookup(&self, query: &str) -> String;
}

struct KnowledgeSection {
    keywords: &'static [&'static str],
    content: &'static str,
}

const GENERAL: KnowledgeSection = KnowledgeSection {
    keywords: &["empresa", "quienes", "quiénes", "que es", "qué es", "plataforma", "company"],
    content: "Somos una plataforma de compra y venta de autos seminuevos con inventario \
              certificado y precios competitivos. Todo el proceso, desde la búsqueda hasta la \
              entrega, puede hacerse en línea o en cualquiera de nuestras sedes.",
};

const SECTIONS: &[KnowledgeSection] = &[
    GENERAL,
    KnowledgeSection {
        keywords: &["sede", "sedes", "ubicación", "ubicacion", "donde", "dónde", "sucursal", "horario"],
        content: "Contamos con sedes y centros de inspección en las principales ciudades del \
                  país. Horario de atención: lunes a domingo de 9:00 a.m. a 6:00 p.m. Puedes \
                  agendar tu visita o pedir que llevemos el auto hasta tu domicilio.",
    },
    KnowledgeSection {
        keywords: &["certificado", "certificación", "certificacion", "calidad", "inspección", "inspeccion", "revisión", "revision"],
        content: "Todos los autos del catálogo pasan por una inspección integral (exterior, \
                  interior y mecánica) realizada por inspectores especializados antes de salir \
                  a la venta, así garantizamos la calidad de cada unidad.",
    },
    KnowledgeSection {
        keywords: &["garantía", "garantia", "devolución", "devolucion", "devolver", "prueba"],
        content: "Tienes 7 días o 300 km de periodo de prueba: si el auto no te convence, lo \
                  devuelves. Además incluye una garantía de 3 meses, con opción de extenderla \
                  por un año adicional.",
    },
    KnowledgeSection {
        keywords: &["financiamiento", "crédito", "credito", "mensualidades", "plan de pago", "pagos"],
        content: "Ofrecemos planes de financiamiento a 3, 4, 5 o 6 años con tasa fija anual. \
                  Solicita tu plan en minutos con identificación oficial, comprobante de \
                  domicilio y comprobantes de ingresos; el primer pago asegura tu compra.",
    },
    KnowledgeSection {
        keywords: &["vender", "venta", "cotización", "cotizacion", "oferta", "intercambio", "anticipo"],
        content: "¿Quieres vender tu auto o usarlo como anticipo? Cotízalo en línea, agenda una \
                  inspección y, si cumple los estándares de calidad, fijamos el precio final y \
                  lo tomamos como enganche del auto que elijas.",
    },
    KnowledgeSection {
        keywords: &["digital", "trámite", "tramite", "papeleo", "videollamada", "línea", "linea", "app"],
        content: "Todo el papeleo se realiza de forma digital, sin salir de casa: eliges el \
                  auto en línea, agendas una videollamada con nuestro equipo y después decides \
                  si pagas directamente o agendas una prueba a domicilio.",
    },
];

/// Default keyword-scored lookup: the section with the most keyword hits
/// answers; zero hits fall back to the general section.
#[derive(Default)]
pub struct KeywordKnowledgeBase;

impl KnowledgeBase for KeywordKnowledgeBase {
    fn lookup(&self, query: &str) -> String {
        let query = query.to_lowercase();

        let best = SECTIONS
            .iter()
            .map(|section| {
                let score =
                    section.keywords.iter().filter(|keyword| query.contains(*keyword)).count();
                (score, section)
            })
            .filter(|(score, _)| *score > 0)
            .max_by_key(|(score, _)| *score);

        match best {
            Some((_, section)) => section.content.to_string(),
            None => GENERAL.content.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{KeywordKnowledgeBase, KnowledgeBase};

    #[test]
    fn picks_the_section_with_the_most_keyword_hits() {
        let kb = KeywordKnowledgeBase;
        let answer = kb.lookup("¿Qué garantía tienen y puedo devolver el auto?");
        assert!(answer.contains("7 días o 300 km"));
    }

    #[test]
    fn unmatched_queries_fall_back_to_the_general_section() {
        let kb = KeywordKnowledgeBase;
        let answer = kb.lookup("hola buen día");
        assert!(answer.contains("plataforma de compra y venta"));
    }

    #[test]
    fn financing_questions_route_to_the_financing_section() {
        let kb = KeywordKnowledgeBase;
        let answer = kb.lookup("¿cómo funcionan las mensualidades y el crédito?");
        assert!(answer.contains("3, 4, 5 o 6 años"));
    }
}
