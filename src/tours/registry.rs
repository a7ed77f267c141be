//! Tour identifiers and their static step definitions.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every tour the app ships. Closed at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourId {
    Welcome,
    Transactions,
    Budgets,
    Reports,
    Assistant,
}

impl TourId {
    pub const ALL: [TourId; 5] = [
        Self::Welcome,
        Self::Transactions,
        Self::Budgets,
        Self::Reports,
        Self::Assistant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Transactions => "transactions",
            Self::Budgets => "budgets",
            Self::Reports => "reports",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for TourId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown tour: {s}"))
    }
}

impl std::fmt::Display for TourId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a tour, anchored to an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourStep {
    /// Anchor identifier of the element the step points at.
    pub target_id: String,
    pub title: String,
    pub body: String,
    /// 1-based position within its tour.
    pub order: u32,
}

impl TourStep {
    pub fn new(target_id: &str, title: &str, body: &str, order: u32) -> Self {
        Self {
            target_id: target_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            order,
        }
    }
}

/// Tour definitions keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TourRegistry {
    tours: HashMap<TourId, Vec<TourStep>>,
}

impl TourRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tours shipped with the app.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (id, steps) in BUILTIN {
            let steps = steps
                .iter()
                .zip(1..)
                .map(|((target, title, body), order)| TourStep::new(target, title, body, order))
                .collect();
            registry.insert(*id, steps);
        }
        registry
    }

    /// Register or replace a tour. Steps are kept sorted by `order`.
    pub fn insert(&mut self, id: TourId, mut steps: Vec<TourStep>) {
        steps.sort_by_key(|s| s.order);
        self.tours.insert(id, steps);
    }

    pub fn get(&self, id: TourId) -> Option<&[TourStep]> {
        self.tours.get(&id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: TourId) -> bool {
        self.tours.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TourId> + '_ {
        self.tours.keys().copied()
    }
}

type StepDef = (&'static str, &'static str, &'static str);

const BUILTIN: &[(TourId, &[StepDef])] = &[
    (
        TourId::Welcome,
        &[
            (
                "dashboard-balance",
                "Seu saldo",
                "Aqui aparece o saldo consolidado de todas as suas contas.",
            ),
            (
                "dashboard-spending-chart",
                "Gastos do mês",
                "Acompanhe para onde seu dinheiro está indo, por categoria.",
            ),
            (
                "dashboard-budget-summary",
                "Orçamentos",
                "Veja rapidamente quanto ainda resta em cada orçamento.",
            ),
            (
                "nav-assistant",
                "Assistente",
                "Tire dúvidas sobre suas finanças conversando com o assistente.",
            ),
        ],
    ),
    (
        TourId::Transactions,
        &[
            (
                "transactions-add",
                "Nova transação",
                "Registre uma receita ou despesa manualmente.",
            ),
            (
                "transactions-import",
                "Importar extrato",
                "Envie um extrato ou planilha e nós cuidamos do resto.",
            ),
            (
                "transactions-filters",
                "Filtros",
                "Filtre por período, conta ou categoria.",
            ),
            (
                "transactions-table",
                "Histórico",
                "Clique em uma transação para editar ou recategorizar.",
            ),
        ],
    ),
    (
        TourId::Budgets,
        &[
            (
                "budgets-create",
                "Criar orçamento",
                "Defina um limite mensal para uma categoria.",
            ),
            (
                "budgets-progress",
                "Progresso",
                "A barra mostra quanto do limite já foi usado.",
            ),
            (
                "budgets-alerts",
                "Alertas",
                "Receba um aviso quando estiver perto de estourar o limite.",
            ),
        ],
    ),
    (
        TourId::Reports,
        &[
            (
                "reports-period",
                "Período",
                "Escolha o intervalo de datas do relatório.",
            ),
            (
                "reports-category-chart",
                "Por categoria",
                "Compare seus gastos entre categorias.",
            ),
            (
                "reports-export",
                "Exportar",
                "Baixe o relatório em PDF ou planilha.",
            ),
        ],
    ),
    (
        TourId::Assistant,
        &[
            (
                "assistant-input",
                "Pergunte",
                "Escreva sua pergunta, por exemplo: quanto gastei com mercado?",
            ),
            (
                "assistant-suggestions",
                "Sugestões",
                "Use uma das perguntas prontas para começar.",
            ),
            (
                "assistant-history",
                "Histórico",
                "Suas conversas anteriores ficam salvas aqui.",
            ),
        ],
    ),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn builtin_covers_every_tour() {
        let registry = TourRegistry::builtin();
        for id in TourId::ALL {
            let steps = registry.get(id).unwrap();
            assert!(!steps.is_empty(), "{id} has no steps");
        }
    }

    #[test]
    fn builtin_orders_are_sequential_and_anchors_unique() {
        let registry = TourRegistry::builtin();
        for id in TourId::ALL {
            let steps = registry.get(id).unwrap();
            let orders: Vec<u32> = steps.iter().map(|s| s.order).collect();
            let expected: Vec<u32> = (1..=steps.len() as u32).collect();
            assert_eq!(orders, expected, "{id}");

            let anchors: HashSet<&str> = steps.iter().map(|s| s.target_id.as_str()).collect();
            assert_eq!(anchors.len(), steps.len(), "{id} repeats an anchor");
        }
    }

    #[test]
    fn insert_sorts_by_order() {
        let mut registry = TourRegistry::new();
        registry.insert(
            TourId::Budgets,
            vec![
                TourStep::new("b", "B", "", 2),
                TourStep::new("a", "A", "", 1),
            ],
        );
        let steps = registry.get(TourId::Budgets).unwrap();
        assert_eq!(steps[0].target_id, "a");
        assert!(!registry.contains(TourId::Welcome));
    }

    #[test]
    fn tour_id_parses_and_serializes_consistently() {
        for id in TourId::ALL {
            assert_eq!(id.as_str().parse::<TourId>().unwrap(), id);
            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                format!("\"{}\"", id.as_str())
            );
        }
        assert!("Welcome".parse::<TourId>().is_err());
        assert!("onboarding".parse::<TourId>().is_err());
    }
}
