// src/utils/html.rs

/// Sanitizes authored quiz text with ammonia's whitelist.
///
/// Formatting tags such as `<b>` survive; `<script>` and `<style>` are dropped
/// together with their content, and event-handler attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
