//! Top-level prompt assembly.
//!
//! The generic path stacks role, exclusions, task, format instructions,
//! common fields and refinement. The staffing format replaces all of that
//! with a fixed organisational-design brief.

use crate::catalog::{Catalog, STAFFING_FORMAT_ID};
use crate::prompt::format::{collect_common_field, collect_format_instruction, InstructionLines};
use crate::prompt::role::build_role;
use crate::prompt::selection::{FieldValue, Selection};

const NOT_SPECIFIED: &str = "(не указано)";

/// Assembles the final prompt. Never fails: missing catalog entries degrade
/// to fallback wording.
pub fn build_prompt(catalog: &Catalog, selection: &Selection) -> String {
    if selection.format() == STAFFING_FORMAT_ID {
        return build_staffing_brief(catalog, selection);
    }

    let mut out: Vec<String> = Vec::new();

    out.push(build_role(catalog, selection));
    out.push(String::new());

    if !selection.exclusions().is_empty() {
        out.push(format!(
            "Исключения: строго избегай {}.",
            selection.exclusions().join(", ")
        ));
        out.push(String::new());
    }

    let task = selection.user_task().trim();
    if !task.is_empty() {
        out.push("Твоя задача:".to_string());
        out.push(task.to_string());
        out.push(String::new());
    }

    let mut instructions = InstructionLines::default();
    collect_format_instruction(catalog, selection, &mut instructions);
    for field in &catalog.common.fields {
        collect_common_field(
            catalog,
            field,
            selection.values().get(&field.id),
            &mut instructions,
        );
    }
    out.extend(instructions.into_lines());

    let refine = selection.refine().trim();
    if !refine.is_empty() {
        out.push(String::new());
        out.push(format!("Уточнение: {refine}."));
    }

    out.join("\n")
}

/// Fixed brief for headcount planning. Task, exclusions, refinement and
/// common fields do not apply here.
pub fn build_staffing_brief(catalog: &Catalog, selection: &Selection) -> String {
    let industry = match selection.industry().trim() {
        "" => "релевантной индустрии",
        name => name,
    };
    let function = match selection.sub_option().trim() {
        "" => "организационной функции",
        label => label,
    };

    let mut lines: Vec<String> = vec![
        format!(
            "Действуй как мировой эксперт McKinsey и Accenture по организационному дизайну в \
             {industry}. Полагайся в ответах на лучшие передовые мировые практики"
        ),
        String::new(),
        "Твоя задача:".into(),
        String::new(),
        "Внимательно проанализируй данные о компании.".into(),
        String::new(),
        format!(
            "Определи целевую численность сотрудников в функции {function} с учетом \
             характеристик, указанными ниже. Изучи введённые данные до конца."
        ),
        "Предложи распределение по ролям с учетом их грейдов.".into(),
        "Предоставь лаконичное (до 100 символов) обоснование расчёта для каждой ячейки данных."
            .into(),
        "Укажи целевую численность в разрезе ролей в таблице и приоритезируй внедрение.".into(),
        String::new(),
    ];

    let fields = catalog
        .format(STAFFING_FORMAT_ID)
        .and_then(|f| f.sub_option(selection.sub_option()))
        .map(|s| s.fields.as_slice())
        .unwrap_or_default();
    if !fields.is_empty() {
        lines.push("Характеристики организации (ввод пользователя):".into());
        for field in fields {
            let value = brief_value(selection.values().get(&field.id));
            lines.push(format!("- {}: {value}", field.label));
        }
        lines.push(String::new());
    }

    lines.extend(
        [
            "Требования к анализу:",
            "- Используй только проверенные данные и авторитетные бенчмарки (Gartner и др.), \
             учитывай размер компании.",
            "- Не додумывай факты — если данных не хватает, сначала запроси уточнение у пользователя.",
            "- Если есть регуляторные требования — учти их.",
            "",
            "По итогу:",
            "- Предоставь итоговую таблицу с ролями, грейдами и численностью, с обоснованиями \
             (до 100 символов).",
        ]
        .map(String::from),
    );

    lines.join("\n")
}

fn brief_value(value: &FieldValue) -> &str {
    match value {
        FieldValue::Bool(true) => "да",
        FieldValue::Text(s) | FieldValue::List(s) if !s.trim().is_empty() => s.as_str(),
        _ => NOT_SPECIFIED,
    }
}
