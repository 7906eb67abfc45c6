#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-vetreport-ui]";

/// Default CSS for the report app, with print rules and overridable tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --report-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --report-bg: #ffffff;
  --report-card-border: rgba(148, 163, 184, 0.28);
  --report-radius: 12px;
  --report-text: #1f2933;
  --report-muted: #52606d;
  --report-heading: #11181c;
  --report-surface: #f8fafc;
  --report-accent: #2563eb;
  --report-flag: #b42318;
  --report-flag-bg: rgba(180, 35, 24, 0.08);
  --report-toast-bg: #fff4f2;
}

.report-root {
  font-family: var(--report-font-family);
  color: var(--report-text);
  max-width: 1040px;
  margin: 0 auto;
  padding: 24px;
  display: flex;
  flex-direction: column;
  gap: 24px;
}

.report-card {
  background: var(--report-bg);
  border: 1px solid var(--report-card-border);
  border-radius: var(--report-radius);
  padding: 20px 24px;
  box-shadow: 0 12px 32px rgba(15, 23, 42, 0.08);
}

.report-card h2,
.report-card h3 {
  color: var(--report-heading);
  margin: 0 0 12px;
}

.upload-status {
  color: var(--report-muted);
  margin: 8px 0 16px;
}

.upload-button,
.report-actions button,
.patient-form button,
.history-toolbar button {
  font: inherit;
  border: none;
  border-radius: 8px;
  padding: 10px 16px;
  cursor: pointer;
  background: var(--report-accent);
  color: #ffffff;
}

button[disabled] {
  opacity: 0.55;
  cursor: not-allowed;
}

button.is-secondary {
  background: var(--report-surface);
  color: var(--report-text);
  border: 1px solid var(--report-card-border);
}

button.is-danger {
  background: var(--report-flag);
}

.visually-hidden {
  position: absolute;
  width: 1px;
  height: 1px;
  overflow: hidden;
  clip: rect(0 0 0 0);
}

.patient-form {
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(220px, 1fr));
  gap: 12px 16px;
}

.patient-form label {
  display: flex;
  flex-direction: column;
  gap: 4px;
  font-size: 0.9rem;
  color: var(--report-muted);
}

.patient-form input,
.patient-form select {
  font: inherit;
  padding: 8px 10px;
  border-radius: 6px;
  border: 1px solid var(--report-card-border);
}

.patient-form .form-actions {
  grid-column: 1 / -1;
  display: flex;
  gap: 8px;
  justify-content: flex-end;
}

.report-actions {
  display: flex;
  justify-content: flex-end;
  gap: 8px;
}

.report-clinic {
  margin: 0 0 4px;
  font-weight: 600;
  color: var(--report-accent);
}

.report-footer {
  margin-top: 8px;
  padding-top: 8px;
  border-top: 1px solid var(--report-card-border);
  font-size: 0.8rem;
  color: var(--report-muted);
  text-align: center;
}

.report-header {
  display: flex;
  justify-content: space-between;
  align-items: baseline;
}

.report-printed-at {
  color: var(--report-muted);
  font-size: 0.85rem;
}

.patient-grid {
  display: grid;
  grid-template-columns: repeat(4, minmax(0, 1fr));
  gap: 6px 16px;
  padding: 12px;
  background: var(--report-surface);
  border-radius: 8px;
  font-size: 0.9rem;
  margin-bottom: 16px;
}

.result-columns {
  display: grid;
  grid-template-columns: 1fr;
  gap: 16px;
}

.result-columns.is-two-column {
  grid-template-columns: 1fr 1fr;
}

.result-table {
  width: 100%;
  border-collapse: collapse;
  font-size: 0.9rem;
}

.result-table th,
.result-table td {
  padding: 6px 8px;
  border-bottom: 1px solid var(--report-card-border);
  text-align: left;
}

.result-table td.result-value,
.result-table td.result-range {
  font-family: ui-monospace, SFMono-Regular, Menlo, monospace;
}

.result-table tr.is-flagged {
  background: var(--report-flag-bg);
}

.result-indicator {
  color: var(--report-flag);
  font-weight: 700;
  text-align: center;
}

.report-disclaimer {
  margin-top: 24px;
  font-size: 0.75rem;
  color: var(--report-muted);
  text-align: center;
}

.history-toolbar {
  display: flex;
  justify-content: space-between;
  align-items: center;
}

.history-list {
  list-style: none;
  margin: 0;
  padding: 0;
}

.history-item {
  display: flex;
  align-items: center;
  justify-content: space-between;
  padding: 8px 4px;
  border-bottom: 1px solid var(--report-card-border);
}

.history-item button.history-open {
  background: none;
  color: inherit;
  text-align: left;
  flex: 1;
  padding: 4px;
}

.history-subtitle {
  display: block;
  color: var(--report-muted);
  font-size: 0.85rem;
}

.history-empty {
  color: var(--report-muted);
  text-align: center;
  padding: 16px;
}

.toast-region {
  position: fixed;
  top: 16px;
  right: 16px;
  display: flex;
  flex-direction: column;
  gap: 8px;
  z-index: 10;
}

.toast {
  background: var(--report-toast-bg);
  border: 1px solid var(--report-flag);
  border-radius: 8px;
  padding: 10px 14px;
  max-width: 360px;
  display: flex;
  gap: 12px;
  align-items: flex-start;
}

.toast strong {
  display: block;
  color: var(--report-flag);
}

@media print {
  .no-print,
  .toast-region {
    display: none !important;
  }

  .report-root {
    padding: 0;
  }

  .report-card {
    box-shadow: none;
    border: none;
    padding: 0;
  }

  .result-columns.is-two-column {
    grid-template-columns: 1fr 1fr;
  }
}
"#;

/// Inject the default styles once per document.
pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document không có thẻ <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-vetreport-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
