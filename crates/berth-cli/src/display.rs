//! Display formatting for CLI output
//!
//! Everything here goes to stderr: stdout is reserved for manifests and
//! JSON so it can be piped straight into `kubectl apply -f -`.

use std::path::Path;

use berth_kube::{
    ConversionError, ConversionResult, ConversionWarning, GeneratedFile, WarningCategory,
    WarningSeverity,
};
use console::{Style, style};

/// Category display order, most urgent first
const CATEGORY_ORDER: [(WarningCategory, &str); 6] = [
    (WarningCategory::Security, "requires attention"),
    (WarningCategory::Networking, "review service discovery"),
    (WarningCategory::Scheduling, "review start order and placement"),
    (WarningCategory::Runtime, "manual migration needed"),
    (WarningCategory::Storage, "review volumes"),
    (WarningCategory::Observability, "review logging and probes"),
];

pub fn print_header(source: &str) {
    eprintln!();
    eprintln!(
        "  {} {} {}",
        style("Berth").bold().cyan(),
        style("─").dim(),
        style("Compose → Kubernetes").dim()
    );
    eprintln!("  {} {}", style("Source:").dim(), style(source).cyan());
    eprintln!();
}

pub fn print_errors(errors: &[ConversionError]) {
    if errors.is_empty() {
        return;
    }

    eprintln!("  {}", style("Errors").bold().red());
    eprintln!("  {}", style("──────").dim());
    for error in errors {
        let location = match (&error.field, error.line) {
            (Some(field), Some(line)) => format!(" at {}:{}", field, line),
            (Some(field), None) => format!(" at {}", field),
            (None, Some(line)) => format!(" at line {}", line),
            (None, None) => String::new(),
        };
        eprintln!(
            "    {} {}{}",
            style("✗").red().bold(),
            style(error.code).bold(),
            style(location).dim()
        );
        eprintln!("      {}", error.message);
        if let Some(suggestion) = &error.suggestion {
            eprintln!("      {} {}", style("→").green(), suggestion);
        }
    }
    eprintln!();
}

pub fn print_warnings(warnings: &[ConversionWarning]) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("  {}", style("Conversion Notes").bold());
    eprintln!("  {}", style("────────────────").dim());

    for (category, hint) in CATEGORY_ORDER {
        let mut in_category: Vec<&ConversionWarning> =
            warnings.iter().filter(|w| w.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        in_category.sort_by(|a, b| b.severity.cmp(&a.severity));

        eprintln!();
        eprintln!(
            "  {} {}",
            category_style(category).apply_to(title(category.label())),
            style(format!("─ {}", hint)).dim()
        );
        for warning in in_category {
            print_warning(warning);
        }
    }
    eprintln!();
}

fn print_warning(warning: &ConversionWarning) {
    let severity = Style::from_dotted_str(warning.severity.color());
    let location = warning
        .field
        .as_deref()
        .map(|f| format!("in {}", f))
        .unwrap_or_default();

    eprintln!(
        "    {} {} {}",
        severity.apply_to(warning.severity.icon()),
        style(warning.code).bold(),
        style(location).dim()
    );
    eprintln!("      {}", style(&warning.message).dim());
    if let Some(suggestion) = &warning.suggestion {
        eprintln!("      {} {}", style("→").green(), suggestion);
    }
}

fn category_style(category: WarningCategory) -> Style {
    match category {
        WarningCategory::Security => Style::new().red().bold(),
        WarningCategory::Runtime => Style::new().magenta().bold(),
        _ => Style::new().yellow().bold(),
    }
}

fn title(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// List of files written under `dir`
pub fn print_written(files: &[GeneratedFile], dir: &Path) {
    eprintln!("  {}", style("Generated Files").bold());
    eprintln!("  {}", style("───────────────").dim());
    for file in files {
        eprintln!(
            "  {} {}",
            style("✓").green().bold(),
            dir.join(&file.path).display()
        );
    }
    eprintln!();
}

pub fn print_summary(result: &ConversionResult) {
    let unsupported = result
        .warnings
        .iter()
        .filter(|w| w.severity == WarningSeverity::Unsupported)
        .count();

    let icon = if result.success {
        style("✓").green().bold()
    } else if result.files.is_empty() {
        style("✗").red().bold()
    } else {
        style("⚠").yellow().bold()
    };

    eprintln!("{} {}", icon, result.summary());
    if let Some(line) = unsupported_line(unsupported) {
        eprintln!("{}", line);
    }
}

fn unsupported_line(count: usize) -> Option<String> {
    (count > 0).then(|| {
        format!(
            "  {} unsupported feature{} {}",
            style(format!("{:>3}", count)).magenta().bold(),
            if count == 1 { "" } else { "s" },
            style("(needs manual migration)").dim()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title() {
        assert_eq!(title("networking"), "Networking");
        assert_eq!(title(""), "");
    }

    #[test]
    fn test_unsupported_line() {
        assert_eq!(unsupported_line(0), None);
        let line = unsupported_line(2).unwrap();
        assert_eq!(
            console::strip_ansi_codes(&line),
            "    2 unsupported features (needs manual migration)"
        );
        let line = unsupported_line(1).unwrap();
        assert!(console::strip_ansi_codes(&line).contains("1 unsupported feature ("));
    }

    #[test]
    fn test_every_category_is_ordered() {
        for category in [
            WarningCategory::Networking,
            WarningCategory::Scheduling,
            WarningCategory::Runtime,
            WarningCategory::Storage,
            WarningCategory::Security,
            WarningCategory::Observability,
        ] {
            assert!(CATEGORY_ORDER.iter().any(|(c, _)| *c == category));
        }
    }
}
