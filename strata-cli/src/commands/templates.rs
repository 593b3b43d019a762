/// Template used by `strata new` when no `strata.migrations.template` is configured.
pub const DEFAULT_TEMPLATE: &str = "-- {{key}}\n-- migrate:up\n\n-- migrate:down\n";

/// Simple template rendering: replaces `{{key}}` with value.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut output = template.to_string();
    for (key, value) in vars {
        output = output.replace(&format!("{{{{{key}}}}}"), value);
    }
    output
}
