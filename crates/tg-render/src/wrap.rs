//! Optional envelopes around rendered diagram text.

/// How the caller wants the diagram delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wrapping {
    #[default]
    None,
    /// A ```` ```mermaid ```` fenced block, for pasting into markdown.
    Fence,
    /// A standalone HTML page that renders the diagram in a browser.
    Html,
}

const FENCE_HEAD: &str = "```mermaid\n";
const FENCE_TAIL: &str = "\n```\n";

const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Task Graph</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 0; padding: 20px; }
        .mermaid { display: flex; justify-content: center; }
    </style>
</head>
<body>
<pre class="mermaid">
"#;

const HTML_TAIL: &str = r#"</pre>
<script type="module">
    import mermaid from "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs";
    mermaid.initialize({ startOnLoad: true, securityLevel: "loose" });
</script>
</body>
</html>
"#;

#[must_use]
pub fn wrap(diagram: &str, wrapping: Wrapping) -> String {
    match wrapping {
        Wrapping::None => diagram.to_string(),
        Wrapping::Fence => format!("{FENCE_HEAD}{diagram}{FENCE_TAIL}"),
        Wrapping::Html => format!("{HTML_HEAD}{diagram}{HTML_TAIL}"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Wrapping, wrap};

    #[test]
    fn no_wrapping_returns_diagram() {
        assert_eq!(wrap("flowchart\n", Wrapping::None), "flowchart\n");
    }

    #[test]
    fn fence_wraps_in_mermaid_block() {
        assert_eq!(
            wrap("flowchart\n", Wrapping::Fence),
            "```mermaid\nflowchart\n\n```\n"
        );
    }

    #[test]
    fn html_places_diagram_in_mermaid_pre() {
        let page = wrap("flowchart\n", Wrapping::Html);
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<pre class=\"mermaid\">\nflowchart\n</pre>"));
        assert!(page.trim_end().ends_with("</html>"));
    }
}
