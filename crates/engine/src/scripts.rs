//! In-page scripts the engine runs through [`crate::PageDriver::execute`]
//!
//! Each script has a stable name so drivers (and test doubles) can identify
//! it without comparing bodies. Element arguments arrive as `arguments[n]`.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Script {
    pub name: &'static str,
    pub body: &'static str,
}

impl std::fmt::Display for Script {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Batched readonly signal collection for a field host.
///
/// Result shape matches [`crate::classifier::RawReadonlyState`].
pub const READONLY_SIGNALS: Script = Script {
    name: "readonly_signals",
    body: r#"
var host = arguments[0];
function val(x){ return x == null ? null : String(x); }
var res = {
  hostReadonly: val(host.getAttribute('readonly')),
  hostDisabled: val(host.getAttribute('disabled')),
  hasLockIcon: !!host.querySelector('.readonly-icon,[data-mat-icon-name="lock"],[title*="Non-editable"]'),
  inputs: []
};
host.querySelectorAll('input,textarea,select,[role="combobox"]').forEach(function(n){
  res.inputs.push({
    readonlyAttr: val(n.getAttribute('readonly')),
    disabledAttr: val(n.getAttribute('disabled')),
    ariaReadonly: val(n.getAttribute('aria-readonly')),
    ariaDisabled: val(n.getAttribute('aria-disabled')),
    readOnlyProp: !!n.readOnly,
    disabledProp: !!n.disabled
  });
});
return res;
"#,
};

pub const CLICK: Script = Script {
    name: "click",
    body: "arguments[0].click();",
};

/// Assign `arguments[1]` as the control value and fire `input`.
pub const ASSIGN_VALUE: Script = Script {
    name: "assign_value",
    body: r#"
var e = arguments[0];
e.value = arguments[1];
e.dispatchEvent(new Event('input', {bubbles: true}));
"#,
};

/// Fire `change` then `blur` so reactive bindings observe an update.
pub const CHANGE_AND_BLUR: Script = Script {
    name: "change_and_blur",
    body: r#"
var e = arguments[0];
e.dispatchEvent(new Event('change', {bubbles: true}));
e.dispatchEvent(new Event('blur', {bubbles: true}));
if (typeof e.blur === 'function') { e.blur(); }
"#,
};

/// Move focus away from the control.
pub const BLUR: Script = Script {
    name: "blur",
    body: r#"
var e = arguments[0];
if (typeof e.blur === 'function') { e.blur(); }
e.dispatchEvent(new Event('blur', {bubbles: true}));
e.dispatchEvent(new Event('focusout', {bubbles: true}));
"#,
};

pub const SCROLL_INTO_VIEW: Script = Script {
    name: "scroll_into_view",
    body: "arguments[0].scrollIntoView({block:'center',inline:'center'});",
};

pub const OUTER_HTML: Script = Script {
    name: "outer_html",
    body: "return arguments[0].outerHTML;",
};

/// Distinct, trimmed option texts from every visible overlay panel.
pub const COLLECT_OPTIONS: Script = Script {
    name: "collect_options",
    body: r#"
const panels = Array.from(document.querySelectorAll('.cdk-overlay-pane .mat-autocomplete-panel.mat-autocomplete-visible'));
const set = new Set();
for (const p of panels) {
  p.querySelectorAll('.mat-option .chip-text, .mat-option .mat-option-text, .mat-option [crttextoverflowtitle]').forEach(n => {
    const t = (n.innerText || n.textContent || '').trim();
    if (t) set.add(t);
  });
}
return Array.from(set);
"#,
};

/// Scroll every visible overlay panel to its current end.
pub const SCROLL_PANELS_TO_END: Script = Script {
    name: "scroll_panels_to_end",
    body: r#"
const panels = Array.from(document.querySelectorAll('.cdk-overlay-pane .mat-autocomplete-panel.mat-autocomplete-visible'));
for (const p of panels) { p.scrollTop = p.scrollHeight; }
"#,
};

pub const OVERLAY_HTML: Script = Script {
    name: "overlay_html",
    body: r#"
var p = document.querySelector('.cdk-overlay-pane .mat-autocomplete-panel.mat-autocomplete-visible');
return p ? p.outerHTML : '';
"#,
};
