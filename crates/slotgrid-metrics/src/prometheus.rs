//! Prometheus text exposition format.
//!
//! Renders a metrics snapshot for the node-exporter textfile collector or
//! any compatible scraper.

use std::fmt::Write;

use crate::collector::MetricsSnapshot;

/// Render a snapshot into Prometheus text format.
///
/// Every sample carries `labels`; per-role counters add a `role` label.
pub fn render_prometheus(
    snapshot: &MetricsSnapshot,
    namespace: &str,
    labels: &[(String, String)],
) -> String {
    let ns = sanitize_name(namespace);
    let base = format_labels(labels, None);
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# HELP {ns}_time_to_pick_seconds Duration of the most recent selection.");
    let _ = writeln!(out, "# TYPE {ns}_time_to_pick_seconds gauge");
    let _ = writeln!(
        out,
        "{ns}_time_to_pick_seconds{base} {:.6}",
        snapshot.last_pick_time.as_secs_f64()
    );

    let _ = writeln!(out, "# HELP {ns}_time_to_pick_seconds_total Total time spent selecting.");
    let _ = writeln!(out, "# TYPE {ns}_time_to_pick_seconds_total counter");
    let _ = writeln!(
        out,
        "{ns}_time_to_pick_seconds_total{base} {:.6}",
        snapshot.pick_time_total.as_secs_f64()
    );

    let _ = writeln!(out, "# HELP {ns}_picks_total Selection passes completed.");
    let _ = writeln!(out, "# TYPE {ns}_picks_total counter");
    let _ = writeln!(out, "{ns}_picks_total{base} {}", snapshot.picks);

    let _ = writeln!(out, "# HELP {ns}_role_assigned_total Roles handed out, by role.");
    let _ = writeln!(out, "# TYPE {ns}_role_assigned_total counter");
    for (role, count) in &snapshot.roles_assigned {
        let role_labels = format_labels(labels, Some(role));
        let _ = writeln!(out, "{ns}_role_assigned_total{role_labels} {count}");
    }

    let _ = writeln!(out, "# HELP {ns}_random_role_chosen_total Roles chosen by weighted-random fallback.");
    let _ = writeln!(out, "# TYPE {ns}_random_role_chosen_total counter");
    let _ = writeln!(
        out,
        "{ns}_random_role_chosen_total{base} {}",
        snapshot.random_roles_chosen
    );

    let _ = writeln!(out, "# HELP {ns}_errors_total Failed selection passes.");
    let _ = writeln!(out, "# TYPE {ns}_errors_total counter");
    let _ = writeln!(out, "{ns}_errors_total{base} {}", snapshot.errors);

    out
}

fn format_labels(labels: &[(String, String)], role: Option<&str>) -> String {
    let mut pairs: Vec<String> = Vec::with_capacity(labels.len() + 1);
    if let Some(role) = role {
        pairs.push(format!("role=\"{}\"", escape_value(role)));
    }
    for (key, value) in labels {
        pairs.push(format!("{}=\"{}\"", sanitize_name(key), escape_value(value)));
    }
    if pairs.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", pairs.join(","))
    }
}

/// Metric and label names allow `[a-zA-Z0-9_]`.
pub(crate) fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
