//! Privacy filter (spec.md §4.3 step 7): forces color preservation, hides
//! fixed/sticky chrome and overlays, normalizes footnote markup, wraps
//! overflow-prone elements, and hides text containing operator-configured
//! terms. The CSS block is static; operator terms additionally drive a
//! `TreeWalker` text-node scan since a term can appear only in rendered
//! text, never in a class name. Both are injected as scripts; failure to
//! inject is non-fatal to the capture.

/// Extra selectors the operator wants hidden (`PRIVACY_FILTER_TERMS`),
/// matched as class-substring selectors alongside the built-in rules.
#[must_use]
pub fn build_css(extra_terms: &[String]) -> String {
    let mut css = String::from(
        r#"
* {
  -webkit-print-color-adjust: exact !important;
  print-color-adjust: exact !important;
  color-adjust: exact !important;
}
header, nav, footer, aside,
[class*="header"], [class*="nav"], [class*="footer"], [class*="sidebar"],
[class*="sticky"], [class*="fixed"],
[style*="position: fixed"], [style*="position:fixed"],
[style*="position: sticky"], [style*="position:sticky"] {
  display: none !important;
}
* {
  overflow-wrap: break-word !important;
  word-break: break-word !important;
}
sup, sub {
  vertical-align: baseline !important;
  font-size: 100% !important;
}
[class*="footnote"] [class*="tooltip"],
[class*="footnote-tooltip"] {
  display: none !important;
}
[role="dialog"], [class*="modal"], [class*="overlay"], [aria-modal="true"] {
  display: none !important;
}
"#,
    );

    for term in extra_terms {
        css.push_str(&format!(
            "[class*=\"{term}\"] {{ display: none !important; }}\n",
            term = term.replace('"', "")
        ));
    }

    css
}

/// Builds the `TreeWalker` text-node scan (spec.md §4.3 step 7): walk every
/// text node under `<body>`, and for any node whose lowercased text contains
/// one of `extra_terms`, hide the nearest block-level ancestor that isn't a
/// known content container. Returns an empty string when there are no terms
/// to scan for, so the caller can skip injecting a no-op script.
#[must_use]
pub fn build_text_scan_js(extra_terms: &[String]) -> String {
    if extra_terms.is_empty() {
        return String::new();
    }

    let terms_json = serde_json::to_string(
        &extra_terms.iter().map(|t| t.to_lowercase()).collect::<Vec<_>>(),
    )
    .unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"(function() {{
  var terms = {terms_json};
  var containers = ["ARTICLE", "MAIN", "BODY", "HTML"];
  var blockDisplays = ["block", "flex", "grid", "table", "list-item", "table-row", "table-cell"];
  function isBlock(el) {{
    return blockDisplays.indexOf(window.getComputedStyle(el).display) !== -1;
  }}
  if (!document.body) return;
  var walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT, null);
  var hidden = new Set();
  var node;
  while ((node = walker.nextNode())) {{
    var text = (node.textContent || "").toLowerCase();
    var matched = false;
    for (var i = 0; i < terms.length; i++) {{
      if (text.indexOf(terms[i]) !== -1) {{ matched = true; break; }}
    }}
    if (!matched) continue;
    var el = node.parentElement;
    while (el && !isBlock(el)) {{
      el = el.parentElement;
    }}
    if (el && containers.indexOf(el.tagName) === -1 && !hidden.has(el)) {{
      el.style.setProperty("display", "none", "important");
      hidden.add(el);
    }}
  }}
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_color_preservation() {
        let css = build_css(&[]);
        assert!(css.contains("print-color-adjust: exact"));
    }

    #[test]
    fn hides_fixed_and_sticky_chrome() {
        let css = build_css(&[]);
        assert!(css.contains("position: fixed"));
        assert!(css.contains("position: sticky"));
    }

    #[test]
    fn hides_modal_overlays() {
        let css = build_css(&[]);
        assert!(css.contains("aria-modal"));
    }

    #[test]
    fn appends_operator_supplied_terms() {
        let css = build_css(&["newsletter-banner".to_string()]);
        assert!(css.contains("newsletter-banner"));
    }

    #[test]
    fn strips_quotes_from_operator_terms_to_avoid_css_injection() {
        let css = build_css(&["x\"] { color: red } body[class*=\"y".to_string()]);
        assert!(css.contains("[class*=\"x] { color: red } body[class*=y\"]"));
    }

    #[test]
    fn text_scan_js_is_empty_with_no_terms() {
        assert!(build_text_scan_js(&[]).is_empty());
    }

    #[test]
    fn text_scan_js_embeds_lowercased_terms() {
        let js = build_text_scan_js(&["Newsletter Signup".to_string()]);
        assert!(js.contains("newsletter signup"));
        assert!(js.contains("createTreeWalker"));
    }
}
