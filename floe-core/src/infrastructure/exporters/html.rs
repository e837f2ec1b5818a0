// floe-core/src/infrastructure/exporters/html.rs

use crate::domain::compiler::FLOE_VERSION;
use crate::domain::governance::EnforcementResult;
use crate::infrastructure::error::InfrastructureError;
use minijinja::{AutoEscape, Environment, context};

const TEMPLATE_NAME: &str = "enforcement_report.html";

// Static page: no script, inline styles only, every value escaped.
const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>floe enforcement report</title>
<style>
body { font-family: sans-serif; margin: 2rem; color: #1f2933; }
table { border-collapse: collapse; margin-bottom: 1.5rem; }
th, td { border: 1px solid #cbd2d9; padding: 0.3rem 0.6rem; text-align: left; vertical-align: top; }
.error { color: #b42318; } .warning { color: #b54708; } .info { color: #175cd3; }
.passed { color: #067647; } .failed { color: #b42318; }
</style>
</head>
<body>
<h1>Enforcement report</h1>
<p class="{{ state }}">State: <strong>{{ state }}</strong> (level {{ summary.enforcement_level }}, {{ duration_ms }} ms)</p>

<h2>Summary</h2>
<table>
<tr><th>Models validated</th><td>{{ summary.models_validated }}</td></tr>
<tr><th>Models with violations</th><td>{{ summary.models_with_violations }}</td></tr>
<tr><th>Errors</th><td class="error">{{ summary.errors }}</td></tr>
<tr><th>Warnings</th><td class="warning">{{ summary.warnings }}</td></tr>
<tr><th>Info</th><td class="info">{{ summary.infos }}</td></tr>
{% for policy, count in summary.by_policy_type|items %}<tr><th>{{ policy }}</th><td>{{ count }}</td></tr>
{% endfor %}</table>

<h2>Violations</h2>
{% if violations %}<table>
<tr><th>Severity</th><th>Code</th><th>Policy</th><th>Model</th><th>Message</th><th>Suggestion</th></tr>
{% for v in violations %}<tr>
<td class="{{ v.severity }}">{{ v.severity }}</td>
<td><a href="{{ v.documentation_url }}">{{ v.error_code }}</a></td>
<td>{{ v.policy_type }}</td>
<td>{{ v.model_name }}{% if v.column_name %}.{{ v.column_name }}{% endif %}</td>
<td>{{ v.message }}{% if v.override_applied %} <em>(override: {{ v.override_applied }})</em>{% endif %}</td>
<td>{{ v.suggestion or "" }}</td>
</tr>
{% endfor %}</table>
{% else %}<p>No violations.</p>
{% endif %}
<footer>Generated by floe {{ floe_version }}</footer>
</body>
</html>
"#;

pub fn render_html(result: &EnforcementResult) -> Result<String, InfrastructureError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    env.add_template(TEMPLATE_NAME, TEMPLATE)?;

    let html = env.get_template(TEMPLATE_NAME)?.render(context! {
        state => result.state(),
        duration_ms => result.duration_ms(),
        summary => result.summary(),
        violations => result.violations(),
        floe_version => FLOE_VERSION,
    })?;
    Ok(html)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::governance::{
        EnforcementLevel, PolicyType, Violation, ViolationSeverity, codes,
    };
    use anyhow::Result;

    #[test]
    fn test_html_report_escapes_everything() -> Result<()> {
        let v = Violation::new(
            codes::PLACEHOLDER_DESCRIPTION,
            ViolationSeverity::Warning,
            PolicyType::Documentation,
            "gold_revenue",
            "Description '<script>alert(1)</script>' is a placeholder",
        );
        let html = render_html(&EnforcementResult::new(
            vec![v],
            EnforcementLevel::Warn,
            1,
            4,
        ))?;

        assert!(!html.contains("<script"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("FLOE-E222"));
        assert!(html.contains("<th>documentation</th><td>1</td>"));
        assert!(html.contains("State: <strong>passed</strong>"));
        Ok(())
    }

    #[test]
    fn test_empty_report() -> Result<()> {
        let html = render_html(&EnforcementResult::new(vec![], EnforcementLevel::Strict, 0, 0))?;
        assert!(html.contains("No violations."));
        Ok(())
    }
}
