//! `{{ $cli.<key> }}` substitution in string parameters.
//!
//! Plain text replacement only. Tokens naming an unknown key, or any other
//! `{{ ... }}` expression, are left as written.

use std::borrow::Cow;
use std::collections::HashMap;

use orrery_config::{ParameterValue, WorkflowStepDefinition};

const CLI_PREFIX: &str = "$cli.";

/// Substitute every known `{{ $cli.key }}` token in `text`.
pub fn render<'a>(text: &'a str, cli_args: &HashMap<String, String>) -> Cow<'a, str> {
  if cli_args.is_empty() || !text.contains("{{") {
    return Cow::Borrowed(text);
  }

  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  let mut changed = false;

  while let Some(open) = rest.find("{{") {
    let after_open = &rest[open + 2..];
    let Some(close) = after_open.find("}}") else {
      break;
    };

    let expression = after_open[..close].trim();
    let value = expression
      .strip_prefix(CLI_PREFIX)
      .and_then(|key| cli_args.get(key.trim()));

    out.push_str(&rest[..open]);
    match value {
      Some(value) => {
        out.push_str(value);
        changed = true;
      }
      None => out.push_str(&rest[open..open + 2 + close + 2]),
    }
    rest = &after_open[close + 2..];
  }

  if !changed {
    return Cow::Borrowed(text);
  }
  out.push_str(rest);
  Cow::Owned(out)
}

fn render_value(value: &ParameterValue, cli_args: &HashMap<String, String>) -> Option<ParameterValue> {
  match value {
    ParameterValue::String(text) => match render(text, cli_args) {
      Cow::Owned(rendered) => Some(ParameterValue::String(rendered)),
      Cow::Borrowed(_) => None,
    },
    ParameterValue::StringList(items) => {
      let rendered: Vec<Cow<'_, str>> = items.iter().map(|item| render(item, cli_args)).collect();
      if rendered.iter().all(|item| matches!(item, Cow::Borrowed(_))) {
        return None;
      }
      Some(ParameterValue::StringList(
        rendered.into_iter().map(Cow::into_owned).collect(),
      ))
    }
    _ => None,
  }
}

/// The step with its string parameters rendered.
///
/// Borrows the original when nothing needed substituting, which is the
/// common case for per-frame workflows.
pub fn render_step<'a>(
  step: &'a WorkflowStepDefinition,
  cli_args: &HashMap<String, String>,
) -> Cow<'a, WorkflowStepDefinition> {
  if cli_args.is_empty() {
    return Cow::Borrowed(step);
  }

  let mut rendered: Option<WorkflowStepDefinition> = None;
  for (name, value) in &step.parameters {
    if let Some(new_value) = render_value(value, cli_args) {
      rendered
        .get_or_insert_with(|| step.clone())
        .parameters
        .insert(name.clone(), new_value);
    }
  }

  match rendered {
    Some(step) => Cow::Owned(step),
    None => Cow::Borrowed(step),
  }
}
