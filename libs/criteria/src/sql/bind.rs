use super::BindValue;
use crate::escape::escape_like_pattern;

pub(super) fn push_value(bind_params: &mut Vec<BindValue>, value: impl Into<BindValue>) -> usize {
    bind_params.push(value.into());
    bind_params.len()
}

/// Bind `needle` as a literal substring pattern (`%needle%`).
pub(super) fn push_contains_pattern(bind_params: &mut Vec<BindValue>, needle: &str) -> usize {
    bind_params.push(BindValue::Text(format!("%{}%", escape_like_pattern(needle))));
    bind_params.len()
}
