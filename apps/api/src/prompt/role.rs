//! Role framing: the opening "act as" sentence.
//!
//! Selected experts are named in order of weight, heaviest first. Equal
//! weights keep catalog declaration order, so the sentence never depends on
//! the order in which the user ticked the boxes.

use crate::catalog::{Catalog, Expert, Industry};
use crate::prompt::selection::{Selection, DEFAULT_EXPERT_WEIGHT};
use crate::prompt::template::{has_placeholder, render, Placeholder};

pub const FALLBACK_ROLE: &str = "Действуй как опытный профессионал, способный качественно решить \
    поставленную задачу. Используй системный подход и проверенные методики.";

pub const WEIGHT_GUIDANCE: &str = "Учитывай вес каждого эксперта: чем выше вес, тем сильнее его \
    позиция влияет на итоговый ответ.";

#[derive(Debug)]
struct RankedExpert<'a> {
    name: &'a str,
    template: Option<&'a str>,
    weight: u8,
    /// Position in the catalog; `usize::MAX` for names the catalog lacks.
    declared_at: usize,
}

#[derive(Debug)]
struct ExpertFragment {
    text: String,
    shows_weight: bool,
}

/// Builds the role sentence for the selected industry and experts.
pub fn build_role(catalog: &Catalog, selection: &Selection) -> String {
    let industry = catalog.industry(selection.industry());
    let fragments: Vec<ExpertFragment> = rank_experts(catalog, industry, selection)
        .iter()
        .map(render_fragment)
        .collect();

    let experts = fragments
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let weighted = fragments.iter().any(|f| f.shows_weight);

    match (industry, fragments.is_empty()) {
        (Some(industry), false) => {
            let sentence = match non_blank(industry.prompt_template.as_deref()) {
                Some(template) => render(
                    template,
                    &[
                        (Placeholder::Experts, experts.as_str()),
                        (Placeholder::Industry, industry.name.as_str()),
                    ],
                ),
                None => format!(
                    "Действуй как эксперт {experts} в индустрии {}.",
                    industry.name
                ),
            };
            with_weight_guidance(sentence, weighted)
        }
        (Some(industry), true) => format!(
            "Действуй как специалист с глубоким пониманием индустрии {}. \
             Используй отраслевые знания и best practices.",
            industry.name
        ),
        (None, false) => with_weight_guidance(
            format!(
                "Действуй как {experts}. Применяй профессиональный подход и экспертные знания."
            ),
            weighted,
        ),
        (None, true) => FALLBACK_ROLE.to_string(),
    }
}

/// Selected experts sorted by weight descending, then declaration order.
///
/// With a resolved industry only its roster is considered. Without one,
/// selected names are resolved against every industry in declaration order.
fn rank_experts<'a>(
    catalog: &'a Catalog,
    industry: Option<&'a Industry>,
    selection: &'a Selection,
) -> Vec<RankedExpert<'a>> {
    let ranked = |name: &'a str, expert: Option<&'a Expert>, declared_at: usize| RankedExpert {
        name,
        template: expert.and_then(|e| e.prompt_template.as_deref()),
        weight: selection.weight(name),
        declared_at,
    };

    let mut experts: Vec<RankedExpert<'a>> = match industry {
        Some(industry) => industry
            .experts
            .iter()
            .enumerate()
            .filter(|(_, e)| selection.has_expert(&e.name))
            .map(|(idx, e)| ranked(e.name.as_str(), Some(e), idx))
            .collect(),
        None => {
            let declared: Vec<&Expert> = catalog
                .industries
                .iter()
                .flat_map(|i| i.experts.iter())
                .collect();
            selection
                .experts()
                .iter()
                .map(|name| match declared.iter().position(|e| e.name == *name) {
                    Some(idx) => ranked(name.as_str(), Some(declared[idx]), idx),
                    None => ranked(name.as_str(), None, usize::MAX),
                })
                .collect()
        }
    };

    // Stable: names unknown to the catalog keep their selection order.
    experts.sort_by(|a, b| {
        b.weight
            .cmp(&a.weight)
            .then(a.declared_at.cmp(&b.declared_at))
    });
    experts
}

fn render_fragment(expert: &RankedExpert<'_>) -> ExpertFragment {
    let weight = format!("{}%", expert.weight);
    let non_default = expert.weight != DEFAULT_EXPERT_WEIGHT;

    match non_blank(expert.template) {
        Some(template) => {
            let explicit = has_placeholder(template, Placeholder::Weight);
            let mut text = render(
                template,
                &[
                    (Placeholder::Expert, expert.name),
                    (Placeholder::Weight, weight.as_str()),
                ],
            );
            let annotate = !explicit && non_default;
            if annotate {
                text.push_str(&format!(" (вес: {weight})"));
            }
            ExpertFragment {
                text,
                shows_weight: explicit || annotate,
            }
        }
        None if non_default => ExpertFragment {
            text: format!("{} (вес: {weight})", expert.name),
            shows_weight: true,
        },
        None => ExpertFragment {
            text: expert.name.to_string(),
            shows_weight: false,
        },
    }
}

fn with_weight_guidance(sentence: String, weighted: bool) -> String {
    if weighted {
        format!("{sentence} {WEIGHT_GUIDANCE}")
    } else {
        sentence
    }
}

fn non_blank(template: Option<&str>) -> Option<&str> {
    template.filter(|t| !t.trim().is_empty())
}
