use crate::cli::args::CliArgs;
use crate::format::Locale;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.locale.as_deref() {
        if Locale::parse(raw).is_none() {
            return Err(format!("invalid --locale '{raw}', expected ru or en"));
        }
    }
    if let Some(raw) = args.header.as_deref() {
        match raw.split_once(':') {
            Some((name, _)) if !name.trim().is_empty() => {}
            _ => return Err(format!("invalid --header '{raw}', expected \"Key: Value\"")),
        }
    }
    if let Some(raw) = args.url.as_deref() {
        reqwest::Url::parse(raw).map_err(|e| format!("invalid --url '{raw}': {e}"))?;
    }
    Ok(())
}
