//! The five module evaluators.
//!
//! Each module owns an independent, side-effect-free function mapping a
//! snapshot to guidance items:
//!
//! | Module | Rule families |
//! |--------|---------------|
//! | **property** | evidence (inspection coverage), stage |
//! | **evidence** | evidence (completeness, peril corroboration, verification), stage |
//! | **insurance** | evidence (claim presence), stage, discrepancy, recovery |
//! | **contractor** | stage, compliance, execution |
//! | **equity** | evidence (equity figures), recovery |
//!
//! Items leave an evaluator in rule-family order, never severity order.
//! An evaluator that finds nothing emits exactly one low-severity
//! "maintain cadence" item, so guidance is never empty.

mod contractor;
mod equity;
mod evidence;
mod insurance;
mod property;
mod stage;

pub use stage::{template_for, StageTemplate};

use std::collections::BTreeMap;

use crate::snapshot::CaseSnapshot;
use crate::thresholds::Thresholds;
use crate::trace::SourceRef;
use crate::types::{GuidanceItem, GuidanceKind, Module, RuleFamily, Severity};

/// Evaluate one module with default thresholds.
pub fn evaluate(module: Module, snapshot: &CaseSnapshot) -> Vec<GuidanceItem> {
    evaluate_with(module, snapshot, &Thresholds::default())
}

/// Evaluate one module with explicit thresholds.
pub fn evaluate_with(
    module: Module,
    snapshot: &CaseSnapshot,
    thresholds: &Thresholds,
) -> Vec<GuidanceItem> {
    let mut findings = Findings::new(module);

    match module {
        Module::Property => property::evaluate(snapshot, &mut findings),
        Module::Evidence => evidence::evaluate(snapshot, &mut findings),
        Module::Insurance => insurance::evaluate(snapshot, thresholds, &mut findings),
        Module::Contractor => contractor::evaluate(snapshot, &mut findings),
        Module::Equity => equity::evaluate(snapshot, thresholds, &mut findings),
    }

    let items = findings.finish(snapshot);
    tracing::debug!(
        module = %module,
        case_id = %snapshot.case_id,
        items = items.len(),
        "module evaluated"
    );
    items
}

/// Evaluate every module in parallel.
///
/// Evaluators share nothing but the read-only snapshot, so each runs on its
/// own scoped thread. A panic in any evaluator propagates to the caller.
pub fn evaluate_all(
    snapshot: &CaseSnapshot,
    thresholds: &Thresholds,
) -> BTreeMap<Module, Vec<GuidanceItem>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = Module::ALL
            .iter()
            .map(|&module| {
                (
                    module,
                    scope.spawn(move || evaluate_with(module, snapshot, thresholds)),
                )
            })
            .collect();

        handles
            .into_iter()
            .map(|(module, handle)| (module, joined(handle)))
            .collect()
    })
}

/// Join an evaluator thread, re-raising its panic on the caller.
fn joined<T>(handle: std::thread::ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

/// Items collected by one evaluator run.
pub(crate) struct Findings {
    module: Module,
    items: Vec<GuidanceItem>,
}

impl Findings {
    fn new(module: Module) -> Self {
        Self {
            module,
            items: Vec::new(),
        }
    }

    /// Start an item for this module.
    pub(crate) fn item(&self, family: RuleFamily, subject: &str) -> ItemBuilder {
        ItemBuilder::new(self.module, family, subject)
    }

    pub(crate) fn push(&mut self, item: GuidanceItem) {
        self.items.push(item);
    }

    /// Order by rule family and apply the steady-state fallback.
    fn finish(mut self, snapshot: &CaseSnapshot) -> Vec<GuidanceItem> {
        // Stable: items of one family keep their push order.
        self.items.sort_by_key(|item| item.family);

        if self.items.is_empty() {
            self.items.push(steady_state(self.module, snapshot));
        }
        self.items
    }
}

/// Fluent builder for guidance items.
pub(crate) struct ItemBuilder {
    item: GuidanceItem,
}

impl ItemBuilder {
    fn new(module: Module, family: RuleFamily, subject: &str) -> Self {
        Self {
            item: GuidanceItem {
                id: format!("{}.{}.{}", module.as_str(), family.as_str(), subject),
                module,
                family,
                kind: GuidanceKind::Gap,
                title: String::new(),
                why_this_matters: String::new(),
                recommendation: String::new(),
                severity: Severity::Low,
                confidence_score: family.base_confidence(),
                sources: Vec::new(),
            },
        }
    }

    pub(crate) fn kind(mut self, kind: GuidanceKind) -> Self {
        self.item.kind = kind;
        self
    }

    pub(crate) fn severity(mut self, severity: Severity) -> Self {
        self.item.severity = severity;
        self
    }

    pub(crate) fn title(mut self, title: impl Into<String>) -> Self {
        self.item.title = title.into();
        self
    }

    pub(crate) fn why(mut self, why: impl Into<String>) -> Self {
        self.item.why_this_matters = why.into();
        self
    }

    pub(crate) fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.item.recommendation = recommendation.into();
        self
    }

    pub(crate) fn source(mut self, source: SourceRef) -> Self {
        self.item.sources.push(source);
        self
    }

    pub(crate) fn build(self) -> GuidanceItem {
        self.item
    }
}

/// The explicit "nothing open" item.
fn steady_state(module: Module, snapshot: &CaseSnapshot) -> GuidanceItem {
    ItemBuilder::new(module, RuleFamily::Fallback, "steady-state")
        .kind(GuidanceKind::Action)
        .severity(Severity::Low)
        .title("No open conditions: maintain cadence")
        .why(format!(
            "The {} evaluator found no open gaps or risks for case {} at stage {}.",
            module, snapshot.case_id, snapshot.stage
        ))
        .recommend(
            "Maintain the current review cadence and re-run guidance when new evidence, \
             inspections, claim activity or verifications arrive.",
        )
        .source(SourceRef::value("caseId", &snapshot.case_id))
        .source(SourceRef::value("stage", snapshot.stage))
        .build()
}
