use crate::catalog::SortKey;
use crate::cli::args::{CliArgs, Command};
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.base_url.as_deref() {
        crate::utils::parse_base_url(raw)
            .map_err(|e| format!("invalid --base-url '{raw}': {e}"))?;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    match &args.command {
        Command::List(list) => {
            if let Some(raw) = list.sort.as_deref() {
                SortKey::parse(raw).map_err(|e| format!("invalid --sort '{raw}': {e}"))?;
            }
            if let Some(raw) = list.format.as_deref() {
                if OutputFormat::parse(raw).is_none() {
                    return Err(format!(
                        "invalid --format '{raw}', expected text, json or html"
                    ));
                }
            }
            let format = list.format.as_deref().and_then(OutputFormat::parse);
            if list.page && format == Some(OutputFormat::Json) {
                return Err("--page only applies to html output".to_string());
            }
        }
        Command::Show { id, .. } | Command::Delete { id, .. } => validate_id(id)?,
        Command::Edit(edit) => validate_id(&edit.id)?,
        Command::Add(_)
        | Command::Genres
        | Command::Download { .. }
        | Command::InitConfig { .. } => {}
    }
    Ok(())
}

fn validate_id(id: &str) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err("invalid id, expected a non-empty value".to_string());
    }
    if id.contains('/') {
        return Err(format!("invalid id '{id}', must not contain '/'"));
    }
    Ok(())
}
